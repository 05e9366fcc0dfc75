//! The `TagStore` trait and supporting query/result types.
//!
//! The trait is implemented by storage backends (e.g. `motif-store-sqlite`).
//! Higher layers (`motif-api`, `motif-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  topic::{Topic, TopicId, TopicSelector},
  user::User,
  video::{NewVideo, Video, VideoId},
  vote::{DesiredVote, VoteOutcome, VoteValue},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// One user's ballot on one (video, topic) pair — the input to
/// [`TagStore::submit_vote`].
#[derive(Debug, Clone)]
pub struct Ballot {
  pub video_id: VideoId,
  pub topic:    TopicSelector,
  pub user_id:  String,
  /// Display name to record against the user row, if the caller sent one.
  pub username: Option<String>,
  pub desired:  DesiredVote,
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Outcome of [`TagStore::add_video`]. First submission wins: when the id is
/// already present the stored row comes back untouched.
#[derive(Debug, Clone)]
pub enum Submission {
  Created(Video),
  Existing(Video),
}

impl Submission {
  pub fn video(&self) -> &Video {
    match self {
      Self::Created(v) | Self::Existing(v) => v,
    }
  }

  pub fn into_video(self) -> Video {
    match self {
      Self::Created(v) | Self::Existing(v) => v,
    }
  }

  pub fn was_created(&self) -> bool { matches!(self, Self::Created(_)) }
}

/// What [`TagStore::submit_vote`] did.
#[derive(Debug, Clone)]
pub struct VoteReceipt {
  pub outcome:  VoteOutcome,
  /// The topic the ballot resolved to — a fresh id if the ballot's topic
  /// name was created on the fly.
  pub topic_id: TopicId,
}

// ─── Aggregate rows ──────────────────────────────────────────────────────────

/// One row of a per-video tally: a topic and its summed votes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTally {
  pub topic_id:    TopicId,
  pub topic_name:  String,
  pub total_votes: i64,
}

/// A video ranked by how many distinct topics it shares with the subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedTopicMatch {
  pub video_id:            VideoId,
  pub title:               Option<String>,
  pub shared_topics_count: i64,
}

/// A video ranked by embedding cosine similarity to the subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatch {
  #[serde(flatten)]
  pub video:      Video,
  pub similarity: f32,
}

/// The topic a user has voted on most often, counting standing votes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequentTopic {
  pub topic_name:  String,
  pub topic_count: i64,
}

/// Aggregated activity for one user. Counts reflect standing votes; removed
/// votes leave no trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
  pub user_id:              String,
  pub username:             Option<String>,
  pub reputation:           i64,
  pub created_at:           DateTime<Utc>,
  pub submissions_count:    i64,
  pub last_submission_date: Option<DateTime<Utc>>,
  pub most_frequent_tag:    Option<FrequentTopic>,
}

/// One row of the contributor leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
  pub id:                  String,
  pub username:            Option<String>,
  pub contributions_count: i64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Motif tag store backend.
///
/// [`submit_vote`](Self::submit_vote) is the only multi-step write; backends
/// must run it in a single transaction so a failure anywhere leaves no
/// partial state (no user row without the vote it accompanied, no freshly
/// created topic from a failed ballot).
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TagStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Videos ────────────────────────────────────────────────────────────

  /// Register a video. If the id is already present the existing row wins;
  /// in particular its title is never overwritten.
  fn add_video(
    &self,
    input: NewVideo,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  /// Retrieve a video by id. Returns `None` if not found.
  fn get_video(
    &self,
    id: VideoId,
  ) -> impl Future<Output = Result<Option<Video>, Self::Error>> + Send + '_;

  /// Overwrite the stored embedding for a video. Returns `false` if the
  /// video does not exist. Dimension checks happen at the API boundary; the
  /// store accepts whatever it is given.
  fn set_video_embedding(
    &self,
    id: VideoId,
    embedding: Vec<f32>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Read back the stored embedding, if any.
  fn get_video_embedding(
    &self,
    id: VideoId,
  ) -> impl Future<Output = Result<Option<Vec<f32>>, Self::Error>> + Send + '_;

  // ── Topics ────────────────────────────────────────────────────────────

  /// Exact-match lookup by name. Returns `None` if not found.
  fn get_topic_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Topic>, Self::Error>> + Send + '_;

  /// Resolve a selector to a topic id, creating the topic when a name is
  /// not yet registered. Two concurrent creations of the same name must
  /// converge on one id: the unique constraint on the name is the arbiter,
  /// and the loser re-reads the winner's row.
  fn resolve_or_create_topic(
    &self,
    selector: TopicSelector,
  ) -> impl Future<Output = Result<TopicId, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// The standing vote for a (video, topic, user) triple, if any.
  fn get_vote(
    &self,
    video_id: VideoId,
    topic_id: TopicId,
    user_id: String,
  ) -> impl Future<Output = Result<Option<VoteValue>, Self::Error>> + Send + '_;

  /// Process a ballot: upsert the user, resolve the topic, and apply the
  /// vote transition — all inside one transaction.
  fn submit_vote(
    &self,
    ballot: Ballot,
  ) -> impl Future<Output = Result<VoteReceipt, Self::Error>> + Send + '_;

  // ── Aggregation ───────────────────────────────────────────────────────

  /// Per-topic vote sums for a video, highest total first (ties broken by
  /// topic id so the order is stable).
  fn topic_tallies(
    &self,
    video_id: VideoId,
  ) -> impl Future<Output = Result<Vec<TopicTally>, Self::Error>> + Send + '_;

  /// Other videos sharing at least one voted topic with the subject, ranked
  /// by the number of distinct shared topics. The subject never appears in
  /// its own results.
  fn similar_videos(
    &self,
    video_id: VideoId,
  ) -> impl Future<Output = Result<Vec<SharedTopicMatch>, Self::Error>> + Send + '_;

  /// Retrieve a user row by handle. Returns `None` if not found.
  fn get_user(
    &self,
    id: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Aggregated stats for a user. Returns `None` if the user row is absent
  /// (votes from an unregistered handle cannot exist: the row is created
  /// with the first ballot).
  fn user_stats(
    &self,
    id: String,
  ) -> impl Future<Output = Result<Option<UserStats>, Self::Error>> + Send + '_;

  /// Every registered user with their standing-vote count, most active
  /// first. Users who have never voted (or whose votes were all removed)
  /// appear with a count of zero.
  fn users_with_contributions(
    &self,
  ) -> impl Future<Output = Result<Vec<Contributor>, Self::Error>> + Send + '_;

  // ── Vector similarity ─────────────────────────────────────────────────

  /// Rank every other embedded video by cosine similarity to the subject,
  /// best first, truncated to `limit`. A subject with no stored embedding
  /// yields an empty ranking — that is a normal outcome, not an error.
  fn rank_by_similarity(
    &self,
    video_id: VideoId,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<SimilarityMatch>, Self::Error>> + Send + '_;
}
