//! The vault: chunk cache and metadata store working as one file store.

use std::num::NonZeroUsize;
use std::sync::Arc;

use chunkvault_cache::{CacheBackend, ChunkCache, DirectoryBackend, MemoryBackend};
use chunkvault_config::{CacheConfig, ConfigError, VaultConfig};
use chunkvault_metadata::{File, MetadataStore};
use tracing::{error, warn};

use crate::error::VaultError;
use crate::events::{EventSink, NoopSink, PurgeReason, VaultEvent};

/// Build the cache backend selected by `config`.
pub fn cache_backend(config: &CacheConfig) -> Arc<dyn CacheBackend> {
  match config {
    CacheConfig::Memory {
      capacity_bytes: Some(capacity),
    } => Arc::new(MemoryBackend::with_capacity(*capacity)),
    CacheConfig::Memory {
      capacity_bytes: None,
    } => Arc::new(MemoryBackend::new()),
    CacheConfig::Directory { path } => Arc::new(DirectoryBackend::new(path.clone())),
  }
}

/// Chunked file store over a volatile cache and a durable metadata store.
///
/// Generic over `S: EventSink` so callers choose how vault events are
/// observed. `Vault::new()` discards them; `Vault::with_sink()` takes one.
///
/// Operations hold no in-process state between calls. Concurrent calls
/// only share the two backends.
pub struct Vault<B, M, S: EventSink = NoopSink> {
  pub(crate) cache: ChunkCache<B>,
  pub(crate) metadata: M,
  pub(crate) sink: S,
  pub(crate) config: VaultConfig,
  pub(crate) chunk_size: NonZeroUsize,
}

impl<B: CacheBackend, M: MetadataStore> Vault<B, M, NoopSink> {
  /// Create a vault that discards events.
  pub fn new(config: VaultConfig, cache: ChunkCache<B>, metadata: M) -> Result<Self, VaultError> {
    Self::with_sink(config, cache, metadata, NoopSink)
  }
}

impl<B: CacheBackend, M: MetadataStore, S: EventSink> Vault<B, M, S> {
  /// Create a vault that reports events to `sink`.
  pub fn with_sink(
    config: VaultConfig,
    cache: ChunkCache<B>,
    metadata: M,
    sink: S,
  ) -> Result<Self, VaultError> {
    config.validate()?;
    let chunk_size = NonZeroUsize::new(config.chunk_size)
      .ok_or_else(|| ConfigError::invalid("chunk_size", "must be positive"))?;

    Ok(Self {
      cache,
      metadata,
      sink,
      config,
      chunk_size,
    })
  }

  pub fn cache(&self) -> &ChunkCache<B> {
    &self.cache
  }

  pub fn metadata(&self) -> &M {
    &self.metadata
  }

  pub fn config(&self) -> &VaultConfig {
    &self.config
  }

  /// Look up a file by id.
  pub async fn file(&self, file_id: &str) -> Result<File, VaultError> {
    self
      .metadata
      .get_file(file_id)
      .await?
      .ok_or_else(|| VaultError::FileNotFound(file_id.to_string()))
  }

  /// Check that both backends are reachable.
  pub async fn health(&self) -> Result<(), VaultError> {
    self.metadata.ping().await?;
    self.cache.ping().await?;
    Ok(())
  }

  /// Remove a file's chunks from the cache and its row from metadata.
  ///
  /// Best-effort: failures are logged and reported to the sink, never
  /// returned, so they cannot mask the error that triggered the purge.
  pub(crate) async fn purge_file(&self, file: &File, reason: PurgeReason) {
    let keys = file.cache_keys();
    if self.cache.purge(&keys).await.is_none() {
      self.sink.notify(VaultEvent::CleanupFailed {
        file_id: file.id.clone(),
        error: "cache purge incomplete".to_string(),
      });
    }

    match self.metadata.delete_file(&file.id).await {
      Ok(true) => {}
      Ok(false) => {
        warn!(file_id = %file.id, "purge: file row already gone");
      }
      Err(e) => {
        error!(file_id = %file.id, error = %e, "purge: failed to delete file row");
        self.sink.notify(VaultEvent::CleanupFailed {
          file_id: file.id.clone(),
          error: e.to_string(),
        });
      }
    }

    self.sink.notify(VaultEvent::FilePurged {
      file_id: file.id.clone(),
      reason,
    });
  }
}
