use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::{BackendError, CacheBackend};

#[derive(Debug, Default)]
struct Entries {
  values: HashMap<String, Bytes>,
  // Insertion order, oldest first. Used for capacity eviction.
  order: VecDeque<String>,
  size_bytes: u64,
}

impl Entries {
  fn remove(&mut self, key: &str) -> bool {
    match self.values.remove(key) {
      Some(value) => {
        self.size_bytes -= value.len() as u64;
        self.order.retain(|k| k != key);
        true
      }
      None => false,
    }
  }
}

/// In-memory volatile backend.
///
/// With a capacity set, the oldest entries are dropped once the stored
/// payload exceeds it, the way a memcached instance sheds items under
/// memory pressure. Suitable for single-process use and testing.
#[derive(Debug, Default)]
pub struct MemoryBackend {
  entries: RwLock<Entries>,
  capacity_bytes: Option<u64>,
}

impl MemoryBackend {
  /// Unbounded backend.
  pub fn new() -> Self {
    Self::default()
  }

  /// Backend that evicts oldest-first above `capacity_bytes`.
  pub fn with_capacity(capacity_bytes: u64) -> Self {
    Self {
      entries: RwLock::default(),
      capacity_bytes: Some(capacity_bytes),
    }
  }

  /// Drop `key` out-of-band, as the real cache would under eviction.
  pub fn evict(&self, key: &str) -> bool {
    match self.entries.write() {
      Ok(mut entries) => entries.remove(key),
      Err(poisoned) => poisoned.into_inner().remove(key),
    }
  }

  /// Overwrite the stored value for `key` without going through the client.
  /// Returns `false` if the key is not present.
  pub fn tamper(&self, key: &str, value: Bytes) -> bool {
    let mut entries = match self.entries.write() {
      Ok(entries) => entries,
      Err(poisoned) => poisoned.into_inner(),
    };
    match entries.values.get_mut(key) {
      Some(slot) => {
        let old = std::mem::replace(slot, value);
        let new_len = slot.len() as u64;
        entries.size_bytes = entries.size_bytes - old.len() as u64 + new_len;
        true
      }
      None => false,
    }
  }

  /// Number of stored entries.
  pub fn len(&self) -> usize {
    self.read().map(|e| e.values.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Total payload bytes currently held.
  pub fn size_bytes(&self) -> u64 {
    self.read().map(|e| e.size_bytes).unwrap_or(0)
  }

  fn read(&self) -> Result<RwLockReadGuard<'_, Entries>, BackendError> {
    self
      .entries
      .read()
      .map_err(|_| BackendError::Unavailable("memory backend lock poisoned".to_string()))
  }

  fn write(&self) -> Result<RwLockWriteGuard<'_, Entries>, BackendError> {
    self
      .entries
      .write()
      .map_err(|_| BackendError::Unavailable("memory backend lock poisoned".to_string()))
  }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
  async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
    let mut entries = self.write()?;

    entries.remove(key);
    entries.size_bytes += value.len() as u64;
    entries.values.insert(key.to_string(), value);
    entries.order.push_back(key.to_string());

    if let Some(capacity) = self.capacity_bytes {
      while entries.size_bytes > capacity {
        let Some(oldest) = entries.order.pop_front() else {
          break;
        };
        if let Some(value) = entries.values.remove(&oldest) {
          entries.size_bytes -= value.len() as u64;
          debug!(key = %oldest, size = value.len(), "memory_backend_evicted");
        }
      }
    }

    Ok(())
  }

  async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
    Ok(self.read()?.values.get(key).cloned())
  }

  async fn delete(&self, key: &str) -> Result<bool, BackendError> {
    Ok(self.write()?.remove(key))
  }

  async fn contains(&self, key: &str) -> Result<bool, BackendError> {
    Ok(
      self
        .read()?
        .values
        .get(key)
        .is_some_and(|value| !value.is_empty()),
    )
  }

  async fn ping(&self) -> Result<(), BackendError> {
    self.read().map(|_| ())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_set_get_delete() {
    let backend = MemoryBackend::new();

    assert_eq!(backend.get("k").await.unwrap(), None);

    backend.set("k", Bytes::from_static(b"value")).await.unwrap();
    assert_eq!(
      backend.get("k").await.unwrap(),
      Some(Bytes::from_static(b"value"))
    );
    assert_eq!(backend.size_bytes(), 5);

    backend.set("k", Bytes::from_static(b"v2")).await.unwrap();
    assert_eq!(backend.size_bytes(), 2);
    assert_eq!(backend.len(), 1);

    assert!(backend.delete("k").await.unwrap());
    assert!(!backend.delete("k").await.unwrap());
    assert!(backend.is_empty());
  }

  #[tokio::test]
  async fn test_capacity_evicts_oldest_first() {
    let backend = MemoryBackend::with_capacity(8);

    backend.set("a", Bytes::from_static(b"1234")).await.unwrap();
    backend.set("b", Bytes::from_static(b"5678")).await.unwrap();
    backend.set("c", Bytes::from_static(b"9012")).await.unwrap();

    assert_eq!(backend.get("a").await.unwrap(), None);
    assert!(backend.contains("b").await.unwrap());
    assert!(backend.contains("c").await.unwrap());
    assert_eq!(backend.size_bytes(), 8);
  }

  #[tokio::test]
  async fn test_evict_and_tamper() {
    let backend = MemoryBackend::new();
    backend.set("k", Bytes::from_static(b"abc")).await.unwrap();

    assert!(backend.tamper("k", Bytes::from_static(b"xyzw")));
    assert_eq!(backend.size_bytes(), 4);
    assert!(backend.evict("k"));
    assert!(!backend.evict("k"));
    assert!(!backend.tamper("k", Bytes::new()));
  }
}
