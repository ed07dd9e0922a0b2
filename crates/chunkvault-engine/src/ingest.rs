//! Write path: dedup check, chunked write, rollback on failure.

use std::io::{Cursor, SeekFrom};

use bytes::Bytes;
use chunkvault_cache::CacheBackend;
use chunkvault_metadata::{File, FilePart, MetadataStore};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt};
use tracing::{debug, error, info, instrument};

use crate::checksum::{EMPTY_SHA256, checksum_reader, sha256_hex};
use crate::chunker::Chunker;
use crate::error::VaultError;
use crate::events::{EventSink, VaultEvent};
use crate::vault::Vault;

/// Parts staged for commit, plus what was actually read.
struct Staged {
  parts: Vec<FilePart>,
  checksum: String,
  size: u64,
}

impl<B: CacheBackend, M: MetadataStore, S: EventSink> Vault<B, M, S> {
  /// Store the content of `reader` under `name`.
  ///
  /// `checksum` is the SHA-256 of the full content, computed by the caller.
  /// If a file with that checksum exists and all its chunks are still
  /// cached, it is returned unchanged and `reader` is not read. Stale
  /// matches are deleted and the content is written fresh.
  ///
  /// A fresh write rewinds `reader`, chunks it into the cache and commits
  /// the file and all parts in one metadata transaction. If anything fails
  /// before that commit succeeds, the chunks written so far are removed
  /// from the cache and the triggering error is returned.
  #[instrument(name = "vault_ingest", skip_all, fields(name = %name, checksum = %checksum))]
  pub async fn ingest<R>(&self, name: &str, reader: &mut R, checksum: &str) -> Result<File, VaultError>
  where
    R: AsyncRead + AsyncSeek + Unpin + Send,
  {
    if let Some(existing) = self.find_valid_duplicate(checksum).await? {
      return Ok(existing);
    }

    let mut file = File::new(uuid::Uuid::new_v4().to_string(), name);
    debug!(file_id = %file.id, "ingest: writing new file");

    reader.seek(SeekFrom::Start(0)).await?;

    // Keys written so far; removed again if the ingest fails.
    let mut written_keys = Vec::new();

    let staged = match self.write_chunks(&file.id, reader, &mut written_keys).await {
      Ok(staged) => staged,
      Err(e) => {
        self.rollback(&file.id, &written_keys, &e).await;
        return Err(e);
      }
    };

    if staged.checksum != checksum {
      let e = VaultError::ChecksumMismatch {
        expected: checksum.to_string(),
        actual: staged.checksum,
      };
      self.rollback(&file.id, &written_keys, &e).await;
      return Err(e);
    }

    file.checksum = Some(staged.checksum);
    file.parts = staged.parts;

    if let Err(e) = self.metadata.insert_file(&file).await {
      let e = VaultError::from(e);
      self.rollback(&file.id, &written_keys, &e).await;
      return Err(e);
    }

    info!(file_id = %file.id, parts = file.parts.len(), size = staged.size, "ingest_committed");
    self.sink.notify(VaultEvent::FileStored {
      file_id: file.id.clone(),
      checksum: checksum.to_string(),
      parts: file.parts.len(),
      size: staged.size,
    });

    Ok(file)
  }

  /// Hash a seekable reader, then ingest it.
  ///
  /// Enforces the configured size limit before anything is written.
  pub async fn ingest_stream<R>(&self, name: &str, reader: &mut R) -> Result<File, VaultError>
  where
    R: AsyncRead + AsyncSeek + Unpin + Send,
  {
    reader.seek(SeekFrom::Start(0)).await?;
    let (checksum, size) = checksum_reader(reader).await?;
    self.check_size(size)?;
    self.ingest(name, reader, &checksum).await
  }

  /// Ingest an in-memory buffer.
  pub async fn ingest_bytes(&self, name: &str, data: Bytes) -> Result<File, VaultError> {
    self.check_size(data.len() as u64)?;
    let checksum = sha256_hex(&data);
    let mut cursor = Cursor::new(data);
    self.ingest(name, &mut cursor, &checksum).await
  }

  fn check_size(&self, size: u64) -> Result<(), VaultError> {
    let limit = self.config.max_file_size_bytes();
    if size > limit {
      return Err(VaultError::TooLarge { size, limit });
    }
    Ok(())
  }

  /// Return the first file with `checksum` whose chunks are all cached.
  ///
  /// Candidates that lost chunks are deleted (their remaining chunks have
  /// already been purged by the presence check) and the lookup continues.
  /// A row with no parts is only valid for empty content.
  async fn find_valid_duplicate(&self, checksum: &str) -> Result<Option<File>, VaultError> {
    while let Some(existing) = self.metadata.find_by_checksum(checksum).await? {
      let lost_parts = existing.parts.is_empty() && checksum != EMPTY_SHA256;
      if !lost_parts && self.cache.all_present(&existing.cache_keys()).await? {
        debug!(file_id = %existing.id, "ingest: dedup hit");
        self.sink.notify(VaultEvent::DedupHit {
          file_id: existing.id.clone(),
          checksum: checksum.to_string(),
        });
        return Ok(Some(existing));
      }

      info!(file_id = %existing.id, "ingest: dedup candidate lost chunks, deleting");
      self.metadata.delete_file(&existing.id).await?;
      self.sink.notify(VaultEvent::StaleRecordPurged {
        file_id: existing.id,
        checksum: checksum.to_string(),
      });
    }

    Ok(None)
  }

  /// Chunk `reader` into the cache, pushing each key to `written_keys` as
  /// soon as it is stored.
  async fn write_chunks<R>(
    &self,
    file_id: &str,
    reader: &mut R,
    written_keys: &mut Vec<String>,
  ) -> Result<Staged, VaultError>
  where
    R: AsyncRead + Unpin + Send,
  {
    let mut chunker = Chunker::new(reader, self.chunk_size);
    let mut whole = Sha256::new();
    let mut parts = Vec::new();
    let mut size = 0u64;

    while let Some(chunk) = chunker.next_chunk().await? {
      let sequence = parts.len() as i64 + 1;
      let chunk_checksum = sha256_hex(&chunk);
      whole.update(&chunk);
      size += chunk.len() as u64;

      let cache_key = self.cache.put(chunk).await?;
      written_keys.push(cache_key.clone());

      parts.push(FilePart {
        id: uuid::Uuid::new_v4().to_string(),
        file_id: file_id.to_string(),
        sequence,
        checksum: chunk_checksum,
        cache_key,
      });
    }

    Ok(Staged {
      parts,
      checksum: hex::encode(whole.finalize()),
      size,
    })
  }

  async fn rollback(&self, file_id: &str, keys: &[String], cause: &VaultError) {
    error!(file_id = %file_id, keys = keys.len(), error = %cause, "ingest failed, rolling back");

    if self.cache.purge(keys).await.is_none() {
      self.sink.notify(VaultEvent::CleanupFailed {
        file_id: file_id.to_string(),
        error: "cache rollback incomplete".to_string(),
      });
    }

    self.sink.notify(VaultEvent::RollbackPerformed {
      file_id: file_id.to_string(),
      keys: keys.len(),
      error: cause.to_string(),
    });
  }
}
