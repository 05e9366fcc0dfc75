//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{id}/stats` | 404 for a handle that never voted |
//! | `GET`  | `/users/contributions` | Leaderboard, most active first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use motif_core::store::{Contributor, TagStore, UserStats};

use crate::error::ApiError;

/// `GET /users/{id}/stats`
pub async fn stats<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<UserStats>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let stats = store
    .user_stats(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("User not found.".to_owned()))?;
  Ok(Json(stats))
}

/// `GET /users/contributions` — every registered user and their standing-vote
/// count, including zeroes.
pub async fn contributions<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Contributor>>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contributors = store
    .users_with_contributions()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(contributors))
}
