use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which volatile backend holds chunk payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheConfig {
  /// Process-local map. Entries vanish with the process.
  Memory {
    /// Upper bound on stored payload bytes; oldest entries are evicted first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capacity_bytes: Option<u64>,
  },

  /// One file per key under `path`.
  Directory { path: PathBuf },
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self::Memory {
      capacity_bytes: None,
    }
  }
}
