//! Topics — the tags users attach to videos.
//!
//! Topic names are globally unique. Ids are database row ids and are never
//! reused, so a dangling id in a vote row can never silently point at a
//! different topic than it did when the vote was cast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Row id of a topic. Allocation is monotonic; ids are never reused.
pub type TopicId = i64;

/// A tag that can be attached to videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
  pub id:         TopicId,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// Selects the topic a ballot applies to: an existing row id, or a name that
/// is resolved (and created if absent) when the ballot is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicSelector {
  Id(TopicId),
  Name(String),
}

impl TopicSelector {
  /// Build a selector from the optional wire fields. A non-empty name wins
  /// over an id; with no usable name the id is taken as-is and must be
  /// non-zero. Rejection happens here, before any store work.
  pub fn from_parts(name: Option<String>, id: Option<TopicId>) -> Result<Self> {
    match name.as_deref().map(str::trim) {
      Some(name) if !name.is_empty() => Ok(Self::Name(name.to_owned())),
      _ => match id {
        Some(id) if id != 0 => Ok(Self::Id(id)),
        _ => Err(Error::MissingTopic),
      },
    }
  }
}
