use thiserror::Error;

/// Error type for metadata operations.
#[derive(Debug, Error)]
pub enum MetadataError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A record failed validation before reaching the database.
  #[error("invalid record: {0}")]
  InvalidRecord(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Schema migration failed.
  #[error("migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}
