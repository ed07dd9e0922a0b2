//! Vault error types.

use chunkvault_cache::CacheError;
use chunkvault_config::ConfigError;
use chunkvault_metadata::MetadataError;

fn describe_part(sequence: &Option<i64>) -> String {
  match sequence {
    Some(sequence) => format!("part {} checksum mismatch", sequence),
    None => "whole-file checksum mismatch".to_string(),
  }
}

/// Errors that can occur during vault operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
  /// The chunk cache could not be reached. Transient; not retried here.
  #[error("chunk cache unavailable: {message}")]
  CacheUnavailable { message: String },

  /// Specific cache keys were absent or rejected.
  #[error("cache key(s) not found: {}", .keys.join(", "))]
  CacheKeyNotFound { keys: Vec<String> },

  /// Content has been evicted from the cache. The file has been purged.
  #[error("data for file '{file_id}' has been evicted or is unrecoverable")]
  DataUnavailable { file_id: String },

  /// A stored chunk no longer matches its checksum. The file has been purged.
  #[error("data for file '{file_id}' is corrupt: {}", describe_part(.sequence))]
  DataCorrupt {
    file_id: String,
    sequence: Option<i64>,
  },

  /// The content read during ingest does not hash to the supplied checksum.
  #[error("content checksum mismatch: expected {expected}, got {actual}")]
  ChecksumMismatch { expected: String, actual: String },

  /// No file with this id exists.
  #[error("file not found: {0}")]
  FileNotFound(String),

  /// The upload exceeds the configured size limit.
  #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
  TooLarge { size: u64, limit: u64 },

  /// The metadata store failed.
  #[error("metadata store error: {0}")]
  Metadata(#[from] MetadataError),

  /// Reading the input stream failed.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid configuration: {0}")]
  Config(#[from] ConfigError),
}

impl From<CacheError> for VaultError {
  fn from(err: CacheError) -> Self {
    match err {
      CacheError::Unavailable { message } => Self::CacheUnavailable { message },
      CacheError::KeyNotFound { keys } => Self::CacheKeyNotFound { keys },
    }
  }
}
