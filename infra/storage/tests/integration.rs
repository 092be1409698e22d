use fc_storage::*;
use std::fs;
use tempfile::TempDir;

const CHAR_ID: &str = "507f1f77bcf86cd799439011";

async fn storage(temp: &TempDir) -> Storage {
    Storage::builder().root(temp.path()).connect().await.unwrap()
}

#[tokio::test]
async fn test_put_places_file_under_character() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let stored = storage.put(b"image", &[CHAR_ID]).await.unwrap();

    let (dir, file) = stored.relative.split_once('/').unwrap();
    assert_eq!(dir, CHAR_ID);
    let (id, ext) = file.split_once('.').unwrap();
    assert!(ObjectId::is_valid(id));
    assert_eq!(ext, "webp");
    assert_eq!(fs::read(&stored.path).unwrap(), b"image");
    assert!(stored.path.starts_with(storage.root()));
}

#[tokio::test]
async fn test_put_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let stored = storage.put(b"image", &["g", "u", CHAR_ID]).await.unwrap();

    let names: Vec<_> = fs::read_dir(stored.path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(!names[0].contains(".fctmp."));
}

#[tokio::test]
async fn test_put_rejects_invalid_identity() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let err = storage.put(b"x", &["not-an-id"]).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidIdentifier { .. }));

    let err = storage.put(b"x", &[] as &[&str]).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidIdentifier { .. }));

    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_put_rejects_escaping_segments() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let err = storage.put(b"x", &["../..", "..", CHAR_ID]).await.unwrap_err();
    assert!(matches!(err, StorageError::PathTraversalAttempt { .. }));
}

#[tokio::test]
async fn test_write_once() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;
    let id: ObjectId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();

    let first = storage.put_with_id(id, b"first", &[CHAR_ID]).await.unwrap();
    let err = storage.put_with_id(id, b"second", &[CHAR_ID]).await.unwrap_err();

    assert!(matches!(err, StorageError::AlreadyExists { .. }));
    assert_eq!(fs::read(&first.path).unwrap(), b"first");
}

#[tokio::test]
async fn test_concurrent_puts_produce_distinct_files() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let storage = storage.clone();
            tokio::spawn(async move { storage.put(format!("{i}").as_bytes(), &[CHAR_ID]).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(fs::read_dir(temp.path().join(CHAR_ID)).unwrap().count(), 16);
}

#[tokio::test]
async fn test_delete_one_prunes_empty_ancestors() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let stored = storage.put(b"image", &["g", "u", CHAR_ID]).await.unwrap();
    let deleted = storage.delete_one(&[stored.relative.as_str()]).await.unwrap();

    assert_eq!(deleted, stored.relative);
    assert!(!temp.path().join("g/u").join(CHAR_ID).exists());
    assert!(!temp.path().join("g/u").exists());
    assert!(!temp.path().join("g").exists());
    assert!(temp.path().is_dir());
}

#[tokio::test]
async fn test_delete_one_keeps_siblings() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let first = storage.put(b"1", &[CHAR_ID]).await.unwrap();
    let second = storage.put(b"2", &[CHAR_ID]).await.unwrap();

    storage.delete_one(&[first.relative.as_str()]).await.unwrap();

    assert!(!first.path.exists());
    assert!(second.path.exists());
}

#[tokio::test]
async fn test_delete_one_errors() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;
    storage.put(b"1", &[CHAR_ID]).await.unwrap();

    let err = storage.delete_one(&[format!("{CHAR_ID}/missing.webp")]).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));

    let err = storage.delete_one(&[CHAR_ID]).await.unwrap_err();
    assert!(matches!(err, StorageError::IsDirectory { .. }));

    let err = storage.delete_one(&["../../etc/passwd"]).await.unwrap_err();
    assert!(matches!(err, StorageError::PathTraversalAttempt { .. }));
}

#[tokio::test]
async fn test_delete_through_a_file_component_is_not_found() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;
    let stored = storage.put(b"1", &[CHAR_ID]).await.unwrap();

    let err = storage.delete_one(&[format!("{}/extra", stored.relative)]).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));

    let err = storage.delete_subtree(&[stored.relative.as_str(), CHAR_ID]).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));

    assert!(stored.path.exists());
}

#[tokio::test]
async fn test_delete_subtree_removes_everything() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    for _ in 0..3 {
        storage.put(b"image", &[CHAR_ID]).await.unwrap();
    }

    let deleted = storage.delete_subtree(&[CHAR_ID]).await.unwrap();

    assert_eq!(deleted, CHAR_ID);
    assert!(!storage.exists(&[CHAR_ID]).unwrap());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_delete_subtree_errors() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let err = storage.delete_subtree(&[CHAR_ID]).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));

    let err = storage.delete_subtree(&["nope"]).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidIdentifier { .. }));
}

#[tokio::test]
async fn test_connect_prunes_and_purges() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("a/b")).unwrap();
    fs::create_dir_all(temp.path().join("keep")).unwrap();
    fs::write(temp.path().join("keep/file.webp"), b"1").unwrap();

    let storage = storage(&temp).await;

    assert!(!temp.path().join("a").exists());
    assert!(temp.path().join("keep/file.webp").exists());
    assert_eq!(storage.prune().await.unwrap(), 0);
}

#[tokio::test]
async fn test_connect_requires_existing_root_without_create() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");

    let err = Storage::builder().root(&missing).connect().await.unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));

    let storage = Storage::builder().root(&missing).create(true).connect().await.unwrap();
    assert!(storage.root().is_dir());
}

#[tokio::test]
async fn test_custom_extension() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::builder().root(temp.path()).extension("png").connect().await.unwrap();

    let stored = storage.put(b"x", &[CHAR_ID]).await.unwrap();
    assert_eq!(storage.extension(), "png");
    assert!(stored.relative.ends_with(".png"));

    let err = Storage::builder().root(temp.path()).extension("../x").connect().await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidIdentifier { .. }));
}
