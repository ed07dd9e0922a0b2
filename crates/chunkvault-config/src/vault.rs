use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CacheConfig, ConfigError};

/// Default chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 500_000;

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

pub const ENV_CHUNK_SIZE: &str = "CHUNKVAULT_CHUNK_SIZE_BYTES";
pub const ENV_MAX_FILE_SIZE: &str = "CHUNKVAULT_MAX_FILE_SIZE_MB";
pub const ENV_DATABASE_URL: &str = "CHUNKVAULT_DATABASE_URL";
pub const ENV_CACHE_DIR: &str = "CHUNKVAULT_CACHE_DIR";

/// Top-level configuration consumed by the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
  /// Size of each chunk in bytes. The last chunk of a file may be shorter.
  pub chunk_size: usize,

  /// Largest accepted upload, in megabytes.
  pub max_file_size_mb: u64,

  /// sqlx connection URL for the metadata store.
  pub database_url: String,

  /// Chunk cache backend.
  pub cache: CacheConfig,
}

impl Default for VaultConfig {
  fn default() -> Self {
    Self {
      chunk_size: DEFAULT_CHUNK_SIZE,
      max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
      database_url: DEFAULT_DATABASE_URL.to_string(),
      cache: CacheConfig::default(),
    }
  }
}

impl VaultConfig {
  /// Defaults overlaid with `CHUNKVAULT_*` environment variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
  }

  /// Read a JSON config file, then apply environment overrides.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    Self::load_with(path, |key| std::env::var(key).ok())
  }

  /// Read a JSON config file, then apply overrides from `lookup`.
  pub fn load_with<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let content = std::fs::read_to_string(path.as_ref())?;
    let mut config: Self = serde_json::from_str(&content)?;
    config.apply_overrides(lookup)?;
    config.validate()?;
    Ok(config)
  }

  /// Apply overrides from an arbitrary key lookup.
  ///
  /// `lookup` receives the environment variable name and returns its value,
  /// if set. Split out from [`VaultConfig::from_env`] so callers can feed
  /// overrides from something other than the process environment.
  pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(value) = lookup(ENV_CHUNK_SIZE) {
      self.chunk_size = value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(ENV_CHUNK_SIZE, format!("{}", e)))?;
    }

    if let Some(value) = lookup(ENV_MAX_FILE_SIZE) {
      self.max_file_size_mb = value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(ENV_MAX_FILE_SIZE, format!("{}", e)))?;
    }

    if let Some(value) = lookup(ENV_DATABASE_URL) {
      self.database_url = value;
    }

    if let Some(value) = lookup(ENV_CACHE_DIR) {
      self.cache = CacheConfig::Directory {
        path: PathBuf::from(value),
      };
    }

    Ok(())
  }

  /// Check invariants the rest of the system relies on.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.chunk_size == 0 {
      return Err(ConfigError::invalid("chunk_size", "must be positive"));
    }
    if self.max_file_size_mb == 0 {
      return Err(ConfigError::invalid("max_file_size_mb", "must be positive"));
    }
    if self.database_url.trim().is_empty() {
      return Err(ConfigError::invalid("database_url", "must not be empty"));
    }
    Ok(())
  }

  /// Upload limit in bytes.
  pub fn max_file_size_bytes(&self) -> u64 {
    self.max_file_size_mb.saturating_mul(1024 * 1024)
  }

  /// Builder-style override of the chunk size.
  pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
    self.chunk_size = chunk_size;
    self
  }
}
