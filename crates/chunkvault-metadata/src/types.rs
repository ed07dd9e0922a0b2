use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::MetadataError;

/// A user-submitted file.
///
/// `checksum` is the SHA-256 of the complete content and is only set once
/// every part has been written. Stored rows always carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct File {
  pub id: String,
  pub name: String,
  pub checksum: Option<String>,
  pub created_at: DateTime<Utc>,
  #[sqlx(skip)]
  #[serde(default)]
  pub parts: Vec<FilePart>,
}

/// One chunk of a file, as recorded in metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FilePart {
  pub id: String,
  pub file_id: String,
  /// 1-based position within the file.
  pub sequence: i64,
  /// SHA-256 of this chunk's bytes.
  pub checksum: String,
  pub cache_key: String,
}

impl File {
  /// A new, not yet committed file with no checksum and no parts.
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      checksum: None,
      created_at: Utc::now(),
      parts: Vec::new(),
    }
  }

  /// Cache keys of all parts, in sequence order.
  pub fn cache_keys(&self) -> Vec<String> {
    self.parts.iter().map(|p| p.cache_key.clone()).collect()
  }

  /// Check the shape required for a committed row.
  pub fn validate(&self) -> Result<(), MetadataError> {
    if self.checksum.as_deref().is_none_or(str::is_empty) {
      return Err(MetadataError::InvalidRecord(format!(
        "file {} has no checksum",
        self.id
      )));
    }

    for (index, part) in self.parts.iter().enumerate() {
      let expected = index as i64 + 1;
      if part.sequence != expected {
        return Err(MetadataError::InvalidRecord(format!(
          "file {} part {} has sequence {}, expected {}",
          self.id, part.id, part.sequence, expected
        )));
      }
      if part.file_id != self.id {
        return Err(MetadataError::InvalidRecord(format!(
          "part {} belongs to file {}, not {}",
          part.id, part.file_id, self.id
        )));
      }
    }

    Ok(())
  }
}
