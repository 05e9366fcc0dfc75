//! Handlers for the per-video topic endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/videos/{id}/topics` | Aggregated tallies, best first |
//! | `POST` | `/videos/{id}/topics` | Submit a ballot; may toggle a vote off |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use motif_core::{
  store::{Ballot, TagStore, TopicTally},
  topic::{TopicId, TopicSelector},
  user,
  video::VideoId,
  vote::{DesiredVote, VoteOutcome},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{error::ApiError, videos::video_path};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
  pub video_id: VideoId,
  pub topics:   Vec<TopicTally>,
}

/// `GET /videos/{id}/topics` — tallies for every voted topic, highest total
/// first. A video nobody has voted on yields an empty list, not a 404.
pub async fn list_for_video<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<TopicsResponse>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let video_id = video_path(&id)?;
  let topics = store
    .topic_tallies(video_id.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(TopicsResponse { video_id, topics }))
}

// ─── Vote ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /videos/{id}/topics`.
///
/// `desired_vote` defaults to 0 (clear) and is clamped to `[-1, 1]`. A
/// non-empty `name` takes precedence over `topic_id`. Empty strings count as
/// absent; some clients send `""` instead of omitting a field.
#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub name:         Option<String>,
  #[serde(default)]
  pub desired_vote: i64,
  pub user_id:      Option<String>,
  pub username:     Option<String>,
  pub topic_id:     Option<TopicId>,
}

/// `POST /videos/{id}/topics` — submit a ballot.
///
/// 201 when a new vote was recorded, 200 when an existing vote was updated
/// or removed. The response echoes the user id, which is generated
/// server-side when the caller does not send one.
pub async fn vote<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(body): Json<VoteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let video_id = VideoId::parse(&id)
    .map_err(|_| ApiError::BadRequest("Invalid YouTube URL.".to_owned()))?;

  let topic =
    TopicSelector::from_parts(body.name, body.topic_id).map_err(|_| {
      ApiError::BadRequest("Topic name or topic ID is required.".to_owned())
    })?;

  let user_id = body
    .user_id
    .filter(|u| !u.trim().is_empty())
    .unwrap_or_else(user::generate_handle);
  let username = body.username.filter(|u| !u.trim().is_empty());

  let receipt = store
    .submit_vote(Ballot {
      video_id,
      topic,
      user_id: user_id.clone(),
      username,
      desired: DesiredVote::from_clamped(body.desired_vote),
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let (status, message) = match receipt.outcome {
    VoteOutcome::Created => (StatusCode::CREATED, "Vote recorded successfully"),
    VoteOutcome::Updated => (StatusCode::OK, "Vote updated successfully"),
    VoteOutcome::Removed => (StatusCode::OK, "Vote removed successfully"),
  };
  Ok((status, Json(json!({ "message": message, "user_id": user_id }))))
}
