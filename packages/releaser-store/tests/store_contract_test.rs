use releaser_store::{
    FileStore, MemoryStore, ReleaseRecord, ReleaseStore, DEFAULT_PRODUCT_NAME,
};
use tempfile::TempDir;

fn record(version: &str, notes: &str) -> ReleaseRecord {
    ReleaseRecord::build(
        DEFAULT_PRODUCT_NAME,
        version,
        notes,
        "2024-03-01T12:00:00.000Z",
        [
            ("win", format!("https://dl.example.com/{}/win", version)),
            ("linux", format!("https://dl.example.com/{}/linux", version)),
        ],
        false,
    )
}

/// Exercise the behaviour every store implementation has to share.
async fn check_contract(store: &dyn ReleaseStore) {
    assert!(store.list().await.unwrap().is_empty());
    assert!(store.get_latest().await.unwrap_err().is_not_found());

    store.put("1.0.0", &record("1.0.0", "first")).await.unwrap();
    store.set_latest(&record("1.0.0", "first")).await.unwrap();
    store.put("2.0.0", &record("2.0.0", "second")).await.unwrap();
    store.set_latest(&record("2.0.0", "second")).await.unwrap();
    assert_eq!(store.get_latest().await.unwrap().version, "2.0.0");

    let promoted = store.promote("1.0.0").await.unwrap();
    assert_eq!(promoted, store.get("1.0.0").await.unwrap());
    assert_eq!(store.get_latest().await.unwrap(), promoted);

    // Deleting a non-latest version leaves the pointer alone.
    store.delete("2.0.0").await.unwrap();
    assert_eq!(store.get_latest().await.unwrap(), promoted);

    // Deleting the latest version leaves a stale pointer behind.
    store.delete("1.0.0").await.unwrap();
    assert_eq!(store.get_latest().await.unwrap(), promoted);
    assert!(store.get("1.0.0").await.unwrap_err().is_not_found());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_store_contract() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::open(temp_dir.path().join("releases"))
        .await
        .unwrap();
    check_contract(&store).await;
    assert!(temp_dir.path().join("releases/latest.json").exists());
}

#[tokio::test]
async fn test_memory_store_contract() {
    let store = MemoryStore::new();
    check_contract(&store).await;
}
