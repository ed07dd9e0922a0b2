//! Integration tests for the SQLite metadata store.

use chunkvault_metadata::{File, FilePart, MetadataError, MetadataStore, SqliteStore};

async fn memory_store() -> SqliteStore {
  SqliteStore::connect("sqlite::memory:")
    .await
    .expect("failed to open in-memory store")
}

fn new_id() -> String {
  uuid::Uuid::new_v4().to_string()
}

fn committed_file(name: &str, checksum: &str, part_count: i64) -> File {
  let mut file = File::new(new_id(), name);
  file.checksum = Some(checksum.to_string());
  file.parts = (1..=part_count)
    .map(|sequence| FilePart {
      id: new_id(),
      file_id: file.id.clone(),
      sequence,
      checksum: format!("chunk-{}", sequence),
      cache_key: new_id(),
    })
    .collect();
  file
}

async fn count_parts(store: &SqliteStore, file_id: &str) -> i64 {
  sqlx::query_scalar("SELECT COUNT(*) FROM file_parts WHERE file_id = ?")
    .bind(file_id)
    .fetch_one(store.pool())
    .await
    .unwrap()
}

#[tokio::test]
async fn test_insert_and_get_file() {
  let store = memory_store().await;
  let file = committed_file("report.pdf", "abc123", 3);

  store.insert_file(&file).await.unwrap();

  let loaded = store.get_file(&file.id).await.unwrap().expect("file exists");
  assert_eq!(loaded.name, "report.pdf");
  assert_eq!(loaded.checksum.as_deref(), Some("abc123"));
  assert_eq!(
    loaded.parts.iter().map(|p| p.sequence).collect::<Vec<_>>(),
    vec![1, 2, 3]
  );
  assert_eq!(loaded.parts, file.parts);
}

#[tokio::test]
async fn test_get_missing_file() {
  let store = memory_store().await;
  assert!(store.get_file("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_without_checksum_is_rejected() {
  let store = memory_store().await;
  let file = File::new(new_id(), "draft");

  let err = store.insert_file(&file).await.unwrap_err();
  assert!(matches!(err, MetadataError::InvalidRecord(_)));
  assert!(store.list_files().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_insert_leaves_nothing_behind() {
  let store = memory_store().await;
  let mut file = committed_file("dup-part-ids.bin", "abc", 2);
  // Same primary key twice: the second part insert fails inside the transaction.
  file.parts[1].id = file.parts[0].id.clone();

  let err = store.insert_file(&file).await.unwrap_err();
  assert!(matches!(err, MetadataError::Database(_)));
  assert!(store.get_file(&file.id).await.unwrap().is_none());
  assert_eq!(count_parts(&store, &file.id).await, 0);
}

#[tokio::test]
async fn test_empty_file_has_no_parts() {
  let store = memory_store().await;
  let file = committed_file("empty", "e3b0c442", 0);

  store.insert_file(&file).await.unwrap();

  let loaded = store.get_file(&file.id).await.unwrap().unwrap();
  assert!(loaded.parts.is_empty());
}

#[tokio::test]
async fn test_find_by_checksum_returns_oldest() {
  let store = memory_store().await;
  let first = committed_file("a", "same", 1);
  let second = committed_file("b", "same", 1);
  let other = committed_file("c", "different", 1);

  store.insert_file(&first).await.unwrap();
  store.insert_file(&second).await.unwrap();
  store.insert_file(&other).await.unwrap();

  let found = store.find_by_checksum("same").await.unwrap().unwrap();
  assert_eq!(found.id, first.id);
  assert_eq!(found.parts.len(), 1);

  assert!(store.find_by_checksum("nothing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_cascades_to_parts() {
  let store = memory_store().await;
  let file = committed_file("x", "abc", 4);
  store.insert_file(&file).await.unwrap();
  assert_eq!(count_parts(&store, &file.id).await, 4);

  assert!(store.delete_file(&file.id).await.unwrap());
  assert!(store.get_file(&file.id).await.unwrap().is_none());
  assert_eq!(count_parts(&store, &file.id).await, 0);

  assert!(!store.delete_file(&file.id).await.unwrap());
}

#[tokio::test]
async fn test_foreign_key_cascade_on_raw_delete() {
  let store = memory_store().await;
  let file = committed_file("x", "abc", 2);
  store.insert_file(&file).await.unwrap();

  sqlx::query("DELETE FROM files WHERE id = ?")
    .bind(&file.id)
    .execute(store.pool())
    .await
    .unwrap();

  assert_eq!(count_parts(&store, &file.id).await, 0);
}

#[tokio::test]
async fn test_list_files_groups_parts() {
  let store = memory_store().await;
  let a = committed_file("a", "1", 2);
  let b = committed_file("b", "2", 3);
  store.insert_file(&a).await.unwrap();
  store.insert_file(&b).await.unwrap();

  let files = store.list_files().await.unwrap();
  assert_eq!(files.len(), 2);
  assert_eq!(files[0].id, a.id);
  assert_eq!(files[0].parts.len(), 2);
  assert_eq!(files[1].parts.len(), 3);
}

#[tokio::test]
async fn test_ping() {
  let store = memory_store().await;
  store.ping().await.unwrap();
}
