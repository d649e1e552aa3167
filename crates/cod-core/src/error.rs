//! Error types for `cod-core`.
//!
//! The first three variants are caller-correctable and carry enough detail to
//! fix the request. [`Error::Store`] wraps any lower-level fault and is never
//! shown to callers verbatim.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} not found")]
  NotFound(String),

  #[error("{0} already exists")]
  DuplicateKey(String),

  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
