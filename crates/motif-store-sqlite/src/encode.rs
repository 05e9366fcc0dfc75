//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings (which sort chronologically as
//! text), dates as ISO 8601 dates, and embeddings as BLOBs of 4-byte
//! little-endian `f32`s.

use chrono::{DateTime, NaiveDate, Utc};
use motif_core::{
  topic::Topic,
  user::User,
  video::{Video, VideoId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Embedding blobs ─────────────────────────────────────────────────────────

/// Encode a float vector as a BLOB of 4-byte little-endian `f32`s.
pub fn encode_embedding(vec: &[f32]) -> Vec<u8> {
  let mut bytes = Vec::with_capacity(vec.len() * 4);
  for &v in vec {
    bytes.extend_from_slice(&v.to_le_bytes());
  }
  bytes
}

/// Decode a BLOB written by [`encode_embedding`].
pub fn decode_embedding(blob: &[u8]) -> Vec<f32> {
  blob
    .chunks_exact(4)
    .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    .collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `videos` row.
pub struct RawVideo {
  pub id:           String,
  pub title:        Option<String>,
  pub upload_date:  Option<String>,
  pub last_updated: String,
}

impl RawVideo {
  pub fn into_video(self) -> Result<Video> {
    Ok(Video {
      id:           VideoId::parse(&self.id)?,
      title:        self.title,
      upload_date:  self.upload_date.as_deref().map(decode_date).transpose()?,
      last_updated: decode_dt(&self.last_updated)?,
    })
  }
}

/// Raw strings read directly from a `topics` row.
pub struct RawTopic {
  pub id:         i64,
  pub name:       String,
  pub created_at: String,
}

impl RawTopic {
  pub fn into_topic(self) -> Result<Topic> {
    Ok(Topic {
      id:         self.id,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub id:         String,
  pub username:   Option<String>,
  pub reputation: i64,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         self.id,
      username:   self.username,
      reputation: self.reputation,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
