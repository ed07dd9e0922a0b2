use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::key::is_valid_key;
use crate::{BackendError, CacheBackend, CacheError};

/// Outcome of a batch delete.
///
/// Keys that were already gone are an expected result for a volatile cache
/// and are reported here rather than as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
  pub removed: Vec<String>,
  pub already_absent: Vec<String>,
}

impl DeleteReport {
  /// Number of keys the batch covered.
  pub fn total(&self) -> usize {
    self.removed.len() + self.already_absent.len()
  }
}

/// Client over a volatile backend, storing opaque chunk payloads.
pub struct ChunkCache<B> {
  backend: B,
}

impl<B: CacheBackend> ChunkCache<B> {
  pub fn new(backend: B) -> Self {
    Self { backend }
  }

  /// The wrapped backend.
  pub fn backend(&self) -> &B {
    &self.backend
  }

  /// Store `value` under a freshly generated key and return the key.
  pub async fn put(&self, value: Bytes) -> Result<String, CacheError> {
    let key = uuid::Uuid::new_v4().to_string();
    debug!(key = %key, size = value.len(), "cache_put");

    self.backend.set(&key, value).await.map_err(|e| {
      error!(key = %key, error = %e, "cache_put_failed");
      CacheError::from(e)
    })?;

    Ok(key)
  }

  /// Fetch the payload stored under `key`.
  ///
  /// An absent key, an empty value, or a key the backend could never hold
  /// all surface as [`CacheError::KeyNotFound`].
  pub async fn get(&self, key: &str) -> Result<Bytes, CacheError> {
    debug!(key = %key, "cache_get");

    if !is_valid_key(key) {
      return Err(CacheError::key_not_found(key));
    }

    match self.backend.get(key).await {
      Ok(Some(value)) if !value.is_empty() => Ok(value),
      Ok(_) => {
        debug!(key = %key, "cache_key_missing");
        Err(CacheError::key_not_found(key))
      }
      Err(e) => {
        error!(key = %key, error = %e, "cache_get_failed");
        Err(e.into())
      }
    }
  }

  /// Delete every key in `keys`.
  ///
  /// Valid keys are all attempted even when some are rejected. Rejected
  /// keys (malformed, or refused by the backend) fail the call with
  /// [`CacheError::KeyNotFound`] listing them. A transport failure aborts
  /// the batch with [`CacheError::Unavailable`].
  pub async fn delete_many<S: AsRef<str>>(&self, keys: &[S]) -> Result<DeleteReport, CacheError> {
    let mut report = DeleteReport::default();
    let mut rejected = Vec::new();

    debug!(count = keys.len(), "cache_delete_many");

    for key in keys {
      let key = key.as_ref();
      if !is_valid_key(key) {
        rejected.push(key.to_string());
        continue;
      }

      match self.backend.delete(key).await {
        Ok(true) => report.removed.push(key.to_string()),
        Ok(false) => report.already_absent.push(key.to_string()),
        Err(BackendError::RejectedKey(_)) => rejected.push(key.to_string()),
        Err(e) => {
          error!(key = %key, error = %e, "cache_delete_failed");
          return Err(e.into());
        }
      }
    }

    if !report.already_absent.is_empty() {
      debug!(
        count = report.already_absent.len(),
        "cache_delete_many: keys already absent"
      );
    }

    if !rejected.is_empty() {
      warn!(keys = ?rejected, "cache_delete_many: keys rejected");
      return Err(CacheError::KeyNotFound { keys: rejected });
    }

    Ok(report)
  }

  /// Best-effort delete used for cleanup paths.
  ///
  /// Never fails. Returns the report when the batch went through, `None`
  /// when it did not; either way the failure has already been logged.
  pub async fn purge<S: AsRef<str>>(&self, keys: &[S]) -> Option<DeleteReport> {
    if keys.is_empty() {
      return Some(DeleteReport::default());
    }

    match self.delete_many(keys).await {
      Ok(report) => Some(report),
      Err(CacheError::KeyNotFound { keys }) => {
        warn!(keys = ?keys, "cache_purge: rejected keys skipped");
        None
      }
      Err(e) => {
        error!(error = %e, "cache_purge_failed");
        None
      }
    }
  }

  /// Check that every key in `keys` still resolves.
  ///
  /// On the first missing key the whole set is purged: losing one chunk
  /// makes the remaining chunks of that file useless. Returns `false` if
  /// anything was missing.
  pub async fn all_present<S: AsRef<str>>(&self, keys: &[S]) -> Result<bool, CacheError> {
    debug!(count = keys.len(), "cache_all_present");

    for key in keys {
      let key = key.as_ref();
      let present = is_valid_key(key) && self.backend.contains(key).await?;
      if !present {
        debug!(key = %key, "cache_all_present: key missing, purging set");
        self.purge(keys).await;
        return Ok(false);
      }
    }

    Ok(true)
  }

  /// Check that the backend is reachable.
  pub async fn ping(&self) -> Result<(), CacheError> {
    self.backend.ping().await.map_err(CacheError::from)
  }
}
