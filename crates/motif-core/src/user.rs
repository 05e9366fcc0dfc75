//! Contributors.
//!
//! There is no registration flow. A user row is created implicitly the first
//! time a handle casts a ballot; anonymous callers get a generated handle
//! back in the vote response and are expected to keep reusing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contributor, keyed by an opaque handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:         String,
  pub username:   Option<String>,
  /// Reserved for a future ranking weight; currently always zero.
  pub reputation: i64,
  pub created_at: DateTime<Utc>,
}

/// Generate an opaque handle for an anonymous contributor.
///
/// No uniqueness guarantee beyond the UUID itself; the users table primary
/// key is the structural arbiter.
pub fn generate_handle() -> String {
  format!("user-{}", Uuid::new_v4().simple())
}
