//! Vault events and sinks for observability.
//!
//! The vault reports what it did (dedup hits, repairs, rollbacks) through an
//! [`EventSink`] passed in at construction, instead of reaching for a shared
//! logger. Consumers decide whether to log, count, forward or drop them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Why a file was removed from the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeReason {
  /// A chunk was missing from the cache.
  Evicted,
  /// A chunk did not match its recorded checksum.
  Corrupt,
}

/// Events emitted by vault operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
  /// An ingest matched an existing, fully cached file.
  DedupHit { file_id: String, checksum: String },

  /// A dedup candidate had lost chunks and was deleted instead of returned.
  StaleRecordPurged { file_id: String, checksum: String },

  /// A new file and all its parts were committed.
  FileStored {
    file_id: String,
    checksum: String,
    parts: usize,
    size: u64,
  },

  /// An ingest failed and the chunks it had written were removed.
  RollbackPerformed {
    file_id: String,
    keys: usize,
    error: String,
  },

  /// A file was reassembled and verified.
  FileRetrieved { file_id: String, size: u64 },

  /// A file was deleted from cache and metadata after failing a read.
  FilePurged {
    file_id: String,
    reason: PurgeReason,
  },

  /// A best-effort cleanup step did not complete.
  CleanupFailed { file_id: String, error: String },
}

/// Trait for receiving vault events.
pub trait EventSink: Send + Sync {
  /// Called when a vault event occurs.
  fn notify(&self, event: VaultEvent);
}

/// A sink that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
  fn notify(&self, _event: VaultEvent) {}
}

/// A sink that writes each event to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
  fn notify(&self, event: VaultEvent) {
    match event {
      VaultEvent::DedupHit { file_id, checksum } => {
        info!(file_id = %file_id, checksum = %checksum, "dedup_hit");
      }
      VaultEvent::StaleRecordPurged { file_id, checksum } => {
        warn!(file_id = %file_id, checksum = %checksum, "stale_record_purged");
      }
      VaultEvent::FileStored {
        file_id,
        checksum,
        parts,
        size,
      } => {
        info!(file_id = %file_id, checksum = %checksum, parts, size, "file_stored");
      }
      VaultEvent::RollbackPerformed {
        file_id,
        keys,
        error,
      } => {
        warn!(file_id = %file_id, keys, error = %error, "rollback_performed");
      }
      VaultEvent::FileRetrieved { file_id, size } => {
        info!(file_id = %file_id, size, "file_retrieved");
      }
      VaultEvent::FilePurged { file_id, reason } => {
        warn!(file_id = %file_id, reason = ?reason, "file_purged");
      }
      VaultEvent::CleanupFailed { file_id, error } => {
        error!(file_id = %file_id, error = %error, "cleanup_failed");
      }
    }
  }
}

/// A sink that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
  sender: mpsc::UnboundedSender<VaultEvent>,
}

impl ChannelSink {
  pub fn new(sender: mpsc::UnboundedSender<VaultEvent>) -> Self {
    Self { sender }
  }
}

impl EventSink for ChannelSink {
  fn notify(&self, event: VaultEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
  fn notify(&self, event: VaultEvent) {
    (**self).notify(event)
  }
}
