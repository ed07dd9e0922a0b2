#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chunkvault_cache::{BackendError, CacheBackend, ChunkCache, MemoryBackend};
use chunkvault_config::VaultConfig;
use chunkvault_engine::{ChannelSink, Vault, VaultEvent};
use chunkvault_metadata::{File, MetadataError, MetadataStore, SqliteStore};
use tokio::sync::mpsc;

pub type TestVault = Vault<Arc<MemoryBackend>, SqliteStore, ChannelSink>;

pub async fn memory_store() -> SqliteStore {
  SqliteStore::connect("sqlite::memory:")
    .await
    .expect("failed to open in-memory store")
}

pub fn config(chunk_size: usize) -> VaultConfig {
  VaultConfig::default().with_chunk_size(chunk_size)
}

/// A vault over an in-memory cache, returning the backend handle for
/// out-of-band eviction and the receiving end of its event channel.
pub async fn vault(
  chunk_size: usize,
) -> (
  TestVault,
  Arc<MemoryBackend>,
  mpsc::UnboundedReceiver<VaultEvent>,
) {
  let backend = Arc::new(MemoryBackend::new());
  let (tx, rx) = mpsc::unbounded_channel();
  let vault = Vault::with_sink(
    config(chunk_size),
    ChunkCache::new(backend.clone()),
    memory_store().await,
    ChannelSink::new(tx),
  )
  .expect("valid config");
  (vault, backend, rx)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<VaultEvent>) -> Vec<VaultEvent> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

pub async fn count_rows(store: &SqliteStore, table: &str) -> i64 {
  sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
    .fetch_one(store.pool())
    .await
    .unwrap()
}

/// Backend that refuses the `fail_on`-th `set` (1-based) and every one
/// after it. Keys of successful sets are recorded. With `fail_deletes`,
/// every `delete` fails as if the cache went away mid-cleanup.
pub struct FailingBackend {
  pub inner: MemoryBackend,
  fail_on: usize,
  fail_deletes: bool,
  sets: AtomicUsize,
  written: Mutex<Vec<String>>,
}

impl FailingBackend {
  pub fn new(fail_on: usize) -> Arc<Self> {
    Self::build(fail_on, false)
  }

  /// Sets fail from `fail_on` onwards and deletes always fail.
  pub fn with_failing_deletes(fail_on: usize) -> Arc<Self> {
    Self::build(fail_on, true)
  }

  fn build(fail_on: usize, fail_deletes: bool) -> Arc<Self> {
    Arc::new(Self {
      inner: MemoryBackend::new(),
      fail_on,
      fail_deletes,
      sets: AtomicUsize::new(0),
      written: Mutex::new(Vec::new()),
    })
  }

  pub fn written(&self) -> Vec<String> {
    self.written.lock().unwrap().clone()
  }
}

#[async_trait]
impl CacheBackend for FailingBackend {
  async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
    let n = self.sets.fetch_add(1, Ordering::SeqCst) + 1;
    if n >= self.fail_on {
      return Err(BackendError::Unavailable("injected set failure".to_string()));
    }
    self.inner.set(key, value).await?;
    self.written.lock().unwrap().push(key.to_string());
    Ok(())
  }

  async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
    self.inner.get(key).await
  }

  async fn delete(&self, key: &str) -> Result<bool, BackendError> {
    if self.fail_deletes {
      return Err(BackendError::Unavailable("injected delete failure".to_string()));
    }
    self.inner.delete(key).await
  }

  async fn ping(&self) -> Result<(), BackendError> {
    self.inner.ping().await
  }
}

/// SQLite store whose commits always fail; everything else passes through.
pub struct FailingInsertStore {
  pub inner: SqliteStore,
}

impl FailingInsertStore {
  pub async fn new() -> Self {
    Self {
      inner: memory_store().await,
    }
  }
}

#[async_trait]
impl MetadataStore for FailingInsertStore {
  async fn insert_file(&self, _file: &File) -> Result<(), MetadataError> {
    Err(MetadataError::InvalidRecord("injected commit failure".to_string()))
  }

  async fn get_file(&self, file_id: &str) -> Result<Option<File>, MetadataError> {
    self.inner.get_file(file_id).await
  }

  async fn find_by_checksum(&self, checksum: &str) -> Result<Option<File>, MetadataError> {
    self.inner.find_by_checksum(checksum).await
  }

  async fn delete_file(&self, file_id: &str) -> Result<bool, MetadataError> {
    self.inner.delete_file(file_id).await
  }

  async fn list_files(&self) -> Result<Vec<File>, MetadataError> {
    self.inner.list_files().await
  }

  async fn ping(&self) -> Result<(), MetadataError> {
    self.inner.ping().await
  }
}
