//! Video identity and the video record.
//!
//! A video is identified by its 11-character YouTube id. Callers rarely hand
//! us a bare id; they paste whatever is in their address bar. [`VideoId::parse`]
//! accepts both and normalises to the bare id, so every layer below this one
//! deals in exactly one identifier shape.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Length of a YouTube video id.
pub const VIDEO_ID_LEN: usize = 11;

// ─── VideoId ─────────────────────────────────────────────────────────────────

/// A validated YouTube video id: exactly 11 characters of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
  /// Parse a video reference: a bare id or any of the common YouTube URL
  /// shapes (`watch?v=`, `youtu.be/`, `/embed/`, `/v/`, `/e/`, `/shorts/`,
  /// `/live/`), with or without a scheme, with `www.` or `m.` hosts.
  pub fn parse(raw: &str) -> Result<Self> {
    let reference = raw.trim();
    if is_bare_id(reference) {
      return Ok(Self(reference.to_owned()));
    }
    extract_from_url(reference)
      .ok_or_else(|| Error::InvalidVideoReference(raw.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_string(self) -> String { self.0 }
}

impl fmt::Display for VideoId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// Deserialization goes through `parse` so an id arriving in a request body is
// validated like any other reference.
impl<'de> Deserialize<'de> for VideoId {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let raw = String::deserialize(deserializer)?;
    Self::parse(&raw).map_err(serde::de::Error::custom)
  }
}

fn is_id_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_bare_id(s: &str) -> bool {
  s.len() == VIDEO_ID_LEN && s.chars().all(is_id_char)
}

fn extract_from_url(reference: &str) -> Option<VideoId> {
  let parsed = Url::parse(reference)
    .or_else(|_| Url::parse(&format!("https://{reference}")))
    .ok()?;

  let host = parsed.host_str()?;
  let host = host.strip_prefix("www.").unwrap_or(host);
  let host = host.strip_prefix("m.").unwrap_or(host);

  let candidate = match host {
    "youtu.be" => parsed.path_segments()?.next().map(str::to_owned),
    "youtube.com" | "youtube-nocookie.com" => {
      // `watch?v=ID` takes precedence over path forms.
      let from_query = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned());
      from_query.or_else(|| {
        let mut segments = parsed.path_segments()?;
        match segments.next()? {
          "embed" | "v" | "e" | "shorts" | "live" => {
            segments.next().map(str::to_owned)
          }
          _ => None,
        }
      })
    }
    _ => None,
  }?;

  is_bare_id(&candidate).then(|| VideoId(candidate))
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A submitted video. The embedding blob is not part of the read model; it is
/// reached only through the similarity operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
  pub id:           VideoId,
  pub title:        Option<String>,
  pub upload_date:  Option<NaiveDate>,
  /// Server-assigned; refreshed on every mutation of the row.
  pub last_updated: DateTime<Utc>,
}

/// Input to [`crate::store::TagStore::add_video`].
/// `last_updated` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewVideo {
  pub id:    VideoId,
  pub title: Option<String>,
}

impl NewVideo {
  /// Build the insert input, discarding an empty or whitespace-only title.
  pub fn new(id: VideoId, title: Option<String>) -> Self {
    let title = title.filter(|t| !t.trim().is_empty());
    Self { id, title }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
