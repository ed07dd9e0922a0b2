use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::BackendError;

/// Raw volatile key-value backend.
///
/// Implementations may drop entries at any time. `get` returning `None` is
/// a normal outcome, not an error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
  /// Store `value` under `key`, replacing any previous value.
  async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError>;

  /// Fetch the value stored under `key`, if any.
  async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError>;

  /// Remove `key`. Returns `false` if it was already absent.
  async fn delete(&self, key: &str) -> Result<bool, BackendError>;

  /// Whether `key` currently resolves to a non-empty value.
  async fn contains(&self, key: &str) -> Result<bool, BackendError> {
    Ok(self.get(key).await?.is_some_and(|v| !v.is_empty()))
  }

  /// Check that the backend is reachable.
  async fn ping(&self) -> Result<(), BackendError>;
}

#[async_trait]
impl<B: CacheBackend + ?Sized> CacheBackend for Arc<B> {
  async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
    (**self).set(key, value).await
  }

  async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
    (**self).get(key).await
  }

  async fn delete(&self, key: &str) -> Result<bool, BackendError> {
    (**self).delete(key).await
  }

  async fn contains(&self, key: &str) -> Result<bool, BackendError> {
    (**self).contains(key).await
  }

  async fn ping(&self) -> Result<(), BackendError> {
    (**self).ping().await
  }
}
