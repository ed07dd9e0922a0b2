//! Chunkvault Config
//!
//! Serializable configuration for the chunk store. A [`VaultConfig`] is built
//! once at startup and handed to each component by value; nothing in the
//! workspace reads configuration from a global.
//!
//! Configuration can be loaded from:
//! - JSON files (via the CLI with `--config=vault.json`)
//! - Environment variables (`CHUNKVAULT_*`), applied on top of a file or the defaults

mod cache;
mod error;
mod vault;

pub use cache::CacheConfig;
pub use error::ConfigError;
pub use vault::{
  DEFAULT_CHUNK_SIZE, DEFAULT_DATABASE_URL, DEFAULT_MAX_FILE_SIZE_MB, ENV_CACHE_DIR,
  ENV_CHUNK_SIZE, ENV_DATABASE_URL, ENV_MAX_FILE_SIZE, VaultConfig,
};
