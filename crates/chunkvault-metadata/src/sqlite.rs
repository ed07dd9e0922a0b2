use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::debug;

use crate::{File, FilePart, MetadataError, MetadataStore};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if missing) the database at `url` and run migrations.
  ///
  /// The pool holds a single long-lived connection: SQLite serializes
  /// writers anyway, and an in-memory database only lives as long as the
  /// connection that created it.
  pub async fn connect(url: &str) -> Result<Self, MetadataError> {
    let mut options = SqliteConnectOptions::from_str(url)?
      .create_if_missing(true)
      .foreign_keys(true);
    if !url.contains(":memory:") && !url.contains("mode=memory") {
      options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect_with(options)
      .await?;

    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), MetadataError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await?;
    Ok(())
  }

  /// The underlying connection pool.
  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  /// Read one file row and its parts in a single transaction, so a delete
  /// committed in between cannot leave a row without its parts.
  async fn read_file(&self, query: &str, param: &str) -> Result<Option<File>, MetadataError> {
    let mut tx = self.pool.begin().await?;

    let file: Option<File> = sqlx::query_as(query)
      .bind(param)
      .fetch_optional(&mut *tx)
      .await?;

    let file = match file {
      Some(mut file) => {
        file.parts = load_parts(&mut tx, &file.id).await?;
        Some(file)
      }
      None => None,
    };

    tx.commit().await?;
    Ok(file)
  }
}

async fn load_parts(
  conn: &mut SqliteConnection,
  file_id: &str,
) -> Result<Vec<FilePart>, MetadataError> {
  let parts = sqlx::query_as(
    r#"
          SELECT id, file_id, sequence, checksum, cache_key
          FROM file_parts
          WHERE file_id = ?
          ORDER BY sequence ASC
          "#,
  )
  .bind(file_id)
  .fetch_all(conn)
  .await?;

  Ok(parts)
}

#[async_trait]
impl MetadataStore for SqliteStore {
  async fn insert_file(&self, file: &File) -> Result<(), MetadataError> {
    file.validate()?;

    let mut tx = self.pool.begin().await?;

    sqlx::query(
      r#"
            INSERT INTO files (id, name, checksum, created_at)
            VALUES (?, ?, ?, ?)
            "#,
    )
    .bind(&file.id)
    .bind(&file.name)
    .bind(&file.checksum)
    .bind(file.created_at)
    .execute(&mut *tx)
    .await?;

    for part in &file.parts {
      sqlx::query(
        r#"
            INSERT INTO file_parts (id, file_id, sequence, checksum, cache_key)
            VALUES (?, ?, ?, ?, ?)
            "#,
      )
      .bind(&part.id)
      .bind(&part.file_id)
      .bind(part.sequence)
      .bind(&part.checksum)
      .bind(&part.cache_key)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;

    debug!(file_id = %file.id, parts = file.parts.len(), "file_committed");
    Ok(())
  }

  async fn get_file(&self, file_id: &str) -> Result<Option<File>, MetadataError> {
    self
      .read_file(
        r#"
            SELECT id, name, checksum, created_at
            FROM files
            WHERE id = ?
            "#,
        file_id,
      )
      .await
  }

  async fn find_by_checksum(&self, checksum: &str) -> Result<Option<File>, MetadataError> {
    self
      .read_file(
        r#"
            SELECT id, name, checksum, created_at
            FROM files
            WHERE checksum = ?
            ORDER BY created_at ASC, rowid ASC
            LIMIT 1
            "#,
        checksum,
      )
      .await
  }

  async fn delete_file(&self, file_id: &str) -> Result<bool, MetadataError> {
    let mut tx = self.pool.begin().await?;

    // Explicit as well as ON DELETE CASCADE, for connections opened
    // without foreign key enforcement.
    sqlx::query("DELETE FROM file_parts WHERE file_id = ?")
      .bind(file_id)
      .execute(&mut *tx)
      .await?;

    let result = sqlx::query("DELETE FROM files WHERE id = ?")
      .bind(file_id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;

    let deleted = result.rows_affected() > 0;
    debug!(file_id = %file_id, deleted, "file_deleted");
    Ok(deleted)
  }

  async fn list_files(&self) -> Result<Vec<File>, MetadataError> {
    let mut tx = self.pool.begin().await?;

    let mut files: Vec<File> = sqlx::query_as(
      r#"
            SELECT id, name, checksum, created_at
            FROM files
            ORDER BY created_at ASC, rowid ASC
            "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    let parts: Vec<FilePart> = sqlx::query_as(
      r#"
            SELECT id, file_id, sequence, checksum, cache_key
            FROM file_parts
            ORDER BY file_id ASC, sequence ASC
            "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let mut by_file: HashMap<String, Vec<FilePart>> = HashMap::new();
    for part in parts {
      by_file.entry(part.file_id.clone()).or_default().push(part);
    }
    for file in &mut files {
      file.parts = by_file.remove(&file.id).unwrap_or_default();
    }

    Ok(files)
  }

  async fn ping(&self) -> Result<(), MetadataError> {
    sqlx::query("SELECT 1").execute(&self.pool).await?;
    Ok(())
  }
}
