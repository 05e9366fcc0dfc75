//! JSON REST API for Motif.
//!
//! Exposes an axum [`Router`] backed by any [`motif_core::store::TagStore`].
//! CORS, tracing layers, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! axum::serve(listener, motif_api::api_router(store.clone())).await?;
//! ```

pub mod error;
pub mod topics;
pub mod users;
pub mod videos;

use std::sync::Arc;

use axum::{
  Json,
  Router,
  routing::{get, post},
};
use motif_core::store::TagStore;
use serde_json::json;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TagStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Videos
    .route("/videos", post(videos::create::<S>))
    .route("/videos/{id}", get(videos::get_one::<S>))
    .route(
      "/videos/{id}/topics",
      get(topics::list_for_video::<S>).post(topics::vote::<S>),
    )
    .route("/videos/{id}/similar", get(videos::similar::<S>))
    .route("/videos/{id}/embedding", post(videos::set_embedding::<S>))
    .route(
      "/videos/{id}/similar_by_vector",
      get(videos::similar_by_vector::<S>),
    )
    // Users
    .route("/users/contributions", get(users::contributions::<S>))
    .route("/users/{id}/stats", get(users::stats::<S>))
    // Health
    .route("/health", get(health))
    .with_state(store)
}

/// `GET /health` — liveness probe.
async fn health() -> Json<serde_json::Value> {
  Json(json!({ "status": "ok" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────
