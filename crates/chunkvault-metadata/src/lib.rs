//! Chunkvault Metadata
//!
//! This crate provides the durable metadata side of the vault: which files
//! exist, their whole-file checksum, and the ordered list of parts that
//! point into the chunk cache.
//!
//! The [`MetadataStore`] trait defines operations for:
//! - Committing a file together with all of its parts in one transaction
//! - Looking files up by id or by whole-file checksum
//! - Deleting a file and, by cascade, its parts

mod error;
mod sqlite;
mod types;

pub use error::MetadataError;
pub use sqlite::SqliteStore;
pub use types::{File, FilePart};

use async_trait::async_trait;

/// Storage trait for file metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync {
  /// Persist `file` and all of `file.parts` atomically.
  ///
  /// The file must carry a checksum and its parts must be numbered
  /// `1..=n` with no gaps.
  async fn insert_file(&self, file: &File) -> Result<(), MetadataError>;

  /// Get a file by id, with parts in ascending sequence order.
  async fn get_file(&self, file_id: &str) -> Result<Option<File>, MetadataError>;

  /// Get the oldest committed file carrying `checksum`, if any.
  async fn find_by_checksum(&self, checksum: &str) -> Result<Option<File>, MetadataError>;

  /// Delete a file and all of its parts. Returns `false` if it did not exist.
  async fn delete_file(&self, file_id: &str) -> Result<bool, MetadataError>;

  /// List all files, oldest first, with their parts.
  async fn list_files(&self) -> Result<Vec<File>, MetadataError>;

  /// Check database connectivity.
  async fn ping(&self) -> Result<(), MetadataError>;
}
