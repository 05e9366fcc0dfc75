//! Core types and trait definitions for the Motif video-tagging service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod embedding;
pub mod error;
pub mod store;
pub mod topic;
pub mod user;
pub mod video;
pub mod vote;

pub use error::{Error, Result};
