//! Read path: reassemble, verify, purge on failure.

use bytes::{Bytes, BytesMut};
use chunkvault_cache::{CacheBackend, CacheError};
use chunkvault_metadata::{File, MetadataStore};
use tracing::{debug, info, instrument, warn};

use crate::checksum::sha256_hex;
use crate::error::VaultError;
use crate::events::{EventSink, PurgeReason, VaultEvent};
use crate::vault::Vault;

impl<B: CacheBackend, M: MetadataStore, S: EventSink> Vault<B, M, S> {
  /// Reassemble the content of `file` from the cache.
  ///
  /// Either the full, verified content is returned, or the file is purged
  /// from cache and metadata and the call fails with
  /// [`VaultError::DataUnavailable`] (a chunk was evicted) or
  /// [`VaultError::DataCorrupt`] (a chunk did not match its checksum).
  /// A cache outage is returned as-is and leaves the file in place.
  #[instrument(name = "vault_retrieve", skip_all, fields(file_id = %file.id))]
  pub async fn retrieve(&self, file: &File) -> Result<Bytes, VaultError> {
    let mut parts: Vec<_> = file.parts.iter().collect();
    parts.sort_by_key(|part| part.sequence);

    let mut content = BytesMut::new();

    for part in parts {
      let chunk = match self.cache.get(&part.cache_key).await {
        Ok(chunk) => chunk,
        Err(CacheError::KeyNotFound { .. }) => {
          warn!(sequence = part.sequence, key = %part.cache_key, "retrieve: chunk missing");
          self.purge_file(file, PurgeReason::Evicted).await;
          return Err(VaultError::DataUnavailable {
            file_id: file.id.clone(),
          });
        }
        Err(e) => return Err(e.into()),
      };

      if sha256_hex(&chunk) != part.checksum {
        warn!(sequence = part.sequence, key = %part.cache_key, "retrieve: chunk checksum mismatch");
        self.purge_file(file, PurgeReason::Corrupt).await;
        return Err(VaultError::DataCorrupt {
          file_id: file.id.clone(),
          sequence: Some(part.sequence),
        });
      }

      debug!(sequence = part.sequence, size = chunk.len(), "retrieve: chunk verified");
      content.extend_from_slice(&chunk);
    }

    // Every part can verify while the set as a whole is wrong, e.g. a
    // part row pointing at another file's chunk.
    if let Some(expected) = &file.checksum {
      if sha256_hex(&content) != *expected {
        warn!("retrieve: whole-file checksum mismatch");
        self.purge_file(file, PurgeReason::Corrupt).await;
        return Err(VaultError::DataCorrupt {
          file_id: file.id.clone(),
          sequence: None,
        });
      }
    }

    let content = content.freeze();
    info!(size = content.len(), "retrieve_complete");
    self.sink.notify(VaultEvent::FileRetrieved {
      file_id: file.id.clone(),
      size: content.len() as u64,
    });

    Ok(content)
  }

  /// Look up a file by id and retrieve it.
  pub async fn retrieve_by_id(&self, file_id: &str) -> Result<Bytes, VaultError> {
    let file = self.file(file_id).await?;
    self.retrieve(&file).await
  }

  /// All stored files, oldest first.
  pub async fn list_files(&self) -> Result<Vec<File>, VaultError> {
    Ok(self.metadata.list_files().await?)
  }
}
