//! Error types for `motif-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unrecognized video reference: {0:?}")]
  InvalidVideoReference(String),

  #[error("topic name or topic id is required")]
  MissingTopic,

  #[error("embedding must have {expected} dimensions, got {got}")]
  EmbeddingDimension { expected: usize, got: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
