use thiserror::Error;

/// Errors reported by a raw [`CacheBackend`](crate::CacheBackend).
#[derive(Debug, Error)]
pub enum BackendError {
  /// The backend could not be reached or failed mid-operation.
  #[error("backend unavailable: {0}")]
  Unavailable(String),

  /// The backend refused the key itself (malformed, wrong shape).
  #[error("key rejected by backend: {0}")]
  RejectedKey(String),
}

/// Errors surfaced by [`ChunkCache`](crate::ChunkCache).
#[derive(Debug, Error)]
pub enum CacheError {
  /// Transport or connectivity failure. Not retried.
  #[error("chunk cache unavailable: {message}")]
  Unavailable { message: String },

  /// One or more keys are absent, empty, or not valid cache keys.
  #[error("cache key(s) not found: {}", .keys.join(", "))]
  KeyNotFound { keys: Vec<String> },
}

impl CacheError {
  pub fn unavailable(message: impl Into<String>) -> Self {
    Self::Unavailable {
      message: message.into(),
    }
  }

  pub fn key_not_found(key: impl Into<String>) -> Self {
    Self::KeyNotFound {
      keys: vec![key.into()],
    }
  }
}

impl From<BackendError> for CacheError {
  fn from(err: BackendError) -> Self {
    match err {
      BackendError::Unavailable(message) => Self::Unavailable { message },
      BackendError::RejectedKey(key) => Self::KeyNotFound { keys: vec![key] },
    }
  }
}
