//! Handlers for `/videos` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/videos` | Body: `{"id":"<url or bare id>","title":"..."}` |
//! | `GET`  | `/videos/{id}` | 404 if never submitted |
//! | `GET`  | `/videos/{id}/similar` | Ranked by distinct shared topics |
//! | `POST` | `/videos/{id}/embedding` | Body: `{"embedding":[...]}`, 384 floats |
//! | `GET`  | `/videos/{id}/similar_by_vector` | Optional `?limit=`, default 10 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use motif_core::{
  embedding,
  store::{SharedTopicMatch, SimilarityMatch, TagStore},
  video::{NewVideo, Video, VideoId},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

/// Result count for `similar_by_vector` when the caller sends no `limit`.
const DEFAULT_SIMILAR_LIMIT: usize = 10;

/// Parse a path segment as a video id. An ill-formed reference cannot name a
/// stored video, so on lookups the failure reads as a 404.
pub(crate) fn video_path(raw: &str) -> Result<VideoId, ApiError> {
  VideoId::parse(raw)
    .map_err(|_| ApiError::NotFound("Video not found.".to_owned()))
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /videos`. The `id` field carries whatever the
/// client has: a full YouTube URL or a bare 11-character id.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  #[serde(default)]
  pub id:    String,
  pub title: Option<String>,
}

/// `POST /videos` — 201 + the new row on first submission, 200 + the stored
/// row otherwise. Resubmission never modifies the stored row.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.id.trim().is_empty() {
    return Err(ApiError::BadRequest("Video URL is required.".to_owned()));
  }
  let id = VideoId::parse(&body.id)
    .map_err(|_| ApiError::BadRequest("Invalid YouTube URL.".to_owned()))?;

  let submission = store
    .add_video(NewVideo::new(id, body.title))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let status = if submission.was_created() {
    StatusCode::CREATED
  } else {
    StatusCode::OK
  };
  Ok((status, Json(submission.into_video())))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /videos/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Video>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = video_path(&id)?;
  let video = store
    .get_video(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound("Video not found.".to_owned()))?;
  Ok(Json(video))
}

// ─── Similar by shared topics ────────────────────────────────────────────────

/// `GET /videos/{id}/similar` — other videos sharing voted topics with this
/// one, most shared topics first. Always 200; no overlap is an empty list.
pub async fn similar<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<SharedTopicMatch>>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = video_path(&id)?;
  let matches = store
    .similar_videos(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(matches))
}

// ─── Embedding upload ────────────────────────────────────────────────────────

/// JSON body accepted by `POST /videos/{id}/embedding` (sent by the
/// embedding sidecar after it has computed a vector for the video).
#[derive(Debug, Deserialize)]
pub struct EmbeddingBody {
  pub embedding: Vec<f32>,
}

/// `POST /videos/{id}/embedding` — store a similarity vector for the video.
/// 400 if the vector has the wrong dimension, 404 if the video is unknown.
pub async fn set_embedding<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(body): Json<EmbeddingBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = video_path(&id)?;
  embedding::validate_dimension(&body.embedding)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let updated = store
    .set_video_embedding(id, body.embedding)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !updated {
    return Err(ApiError::NotFound("Video not found.".to_owned()));
  }
  Ok(Json(json!({ "message": "Embedding updated successfully" })))
}

// ─── Similar by vector ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SimilarByVectorParams {
  pub limit: Option<usize>,
}

/// `GET /videos/{id}/similar_by_vector[?limit=N]` — other embedded videos
/// ranked by cosine similarity. A subject without a stored embedding yields
/// an empty list, not an error.
pub async fn similar_by_vector<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Query(params): Query<SimilarByVectorParams>,
) -> Result<Json<Vec<SimilarityMatch>>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = video_path(&id)?;
  let limit = params.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT);
  let ranked = store
    .rank_by_similarity(id, limit)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(ranked))
}
