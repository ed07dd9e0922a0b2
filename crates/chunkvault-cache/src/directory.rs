use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{BackendError, CacheBackend};

/// Directory-backed cache.
///
/// Each entry is stored as a file at `{root}/{key}`. Nothing is evicted
/// automatically; removing files from the directory behaves like an eviction.
pub struct DirectoryBackend {
  root: PathBuf,
}

impl DirectoryBackend {
  /// Create a backend rooted at `root`. The directory is created lazily.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn key_to_path(&self, key: &str) -> Result<PathBuf, BackendError> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
      return Err(BackendError::RejectedKey(key.to_string()));
    }
    Ok(self.root.join(key))
  }
}

fn unavailable(err: std::io::Error) -> BackendError {
  BackendError::Unavailable(err.to_string())
}

#[async_trait]
impl CacheBackend for DirectoryBackend {
  async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
    let path = self.key_to_path(key)?;
    fs::create_dir_all(&self.root).await.map_err(unavailable)?;

    // Write beside the target and rename so readers never see a partial value.
    let tmp_path = self.root.join(format!(".{}.tmp", key));
    let mut file = fs::File::create(&tmp_path).await.map_err(unavailable)?;
    file.write_all(&value).await.map_err(unavailable)?;
    file.flush().await.map_err(unavailable)?;
    drop(file);

    fs::rename(&tmp_path, &path).await.map_err(unavailable)
  }

  async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
    let path = self.key_to_path(key)?;
    match fs::read(&path).await {
      Ok(data) => Ok(Some(Bytes::from(data))),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(unavailable(e)),
    }
  }

  async fn delete(&self, key: &str) -> Result<bool, BackendError> {
    let path = self.key_to_path(key)?;
    match fs::remove_file(&path).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
      Err(e) => Err(unavailable(e)),
    }
  }

  async fn contains(&self, key: &str) -> Result<bool, BackendError> {
    let path = self.key_to_path(key)?;
    match fs::metadata(&path).await {
      Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
      Err(e) => Err(unavailable(e)),
    }
  }

  async fn ping(&self) -> Result<(), BackendError> {
    fs::create_dir_all(&self.root).await.map_err(unavailable)?;
    let meta = fs::metadata(&self.root).await.map_err(unavailable)?;
    if meta.is_dir() {
      Ok(())
    } else {
      Err(BackendError::Unavailable(format!(
        "{} is not a directory",
        self.root.display()
      )))
    }
  }
}
