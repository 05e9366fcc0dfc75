//! Embedding vector math.
//!
//! Embeddings are produced outside this service (a sentence-transformer
//! sidecar computes them from video metadata) and uploaded as plain float
//! arrays. This module only checks dimensions and compares vectors.

use crate::error::{Error, Result};

/// Expected embedding width. The upstream model (all-MiniLM-L6-v2) emits
/// 384-dimensional vectors; anything else is rejected at the boundary.
pub const EMBEDDING_DIM: usize = 384;

/// Check that a caller-supplied vector matches [`EMBEDDING_DIM`].
pub fn validate_dimension(embedding: &[f32]) -> Result<()> {
  if embedding.len() == EMBEDDING_DIM {
    Ok(())
  } else {
    Err(Error::EmbeddingDimension {
      expected: EMBEDDING_DIM,
      got:      embedding.len(),
    })
  }
}

/// Cosine similarity between two vectors, in `[-1.0, 1.0]`.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or
/// zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 0.0;
  }

  let mut dot = 0.0f32;
  let mut norm_a = 0.0f32;
  let mut norm_b = 0.0f32;

  for (x, y) in a.iter().zip(b.iter()) {
    dot += x * y;
    norm_a += x * x;
    norm_b += y * y;
  }

  let denom = norm_a.sqrt() * norm_b.sqrt();
  if denom < f32::EPSILON {
    return 0.0;
  }

  dot / denom
}
