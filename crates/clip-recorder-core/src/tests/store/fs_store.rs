use crate::{FsVideoStore, RecorderError, VideoStore, store::fs_store::write_atomic};

use tempfile::TempDir;
use uuid::Uuid;

/// WHAT: A saved artifact lists back with the same id and payload
/// WHY: A stored recording must survive a restart
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_saved_artifact_when_reopening_store_then_artifact_lists() {
    // Given: A payload saved in a fresh store
    let temp = TempDir::new().unwrap();
    let saved = {
        let store = FsVideoStore::open(temp.path()).await.unwrap();
        store.save(vec![0x1A, 0x45, 0xDF, 0xA3]).await.unwrap()
    };

    // When: A new store opens the same directory
    let store = FsVideoStore::open(temp.path()).await.unwrap();
    let listed = store.list_all().await.unwrap();

    // Then: The artifact is returned intact
    assert_eq!(listed, vec![saved.clone()]);
    assert_eq!(listed[0].size_bytes(), 4);
}

/// WHAT: Listing is newest first, and timestamps never repeat
/// WHY: Startup adopts the first entry as the current artifact
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_rapid_saves_when_listing_then_newest_first() {
    // Given: Three saves in quick succession
    let temp = TempDir::new().unwrap();
    let store = FsVideoStore::open(temp.path()).await.unwrap();
    let first = store.save(vec![1]).await.unwrap();
    let second = store.save(vec![2]).await.unwrap();
    let third = store.save(vec![3]).await.unwrap();

    // When: Listing
    let ids: Vec<Uuid> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|artifact| artifact.id)
        .collect();

    // Then: Reverse save order, strictly increasing timestamps
    assert_eq!(ids, vec![third.id, second.id, first.id]);
    assert!(first.created_at < second.created_at);
    assert!(second.created_at < third.created_at);
}

/// WHAT: Saves after a reopen sort after artifacts already on disk
/// WHY: A fresh clock must not produce an older timestamp than stored data
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_reopened_store_when_saving_then_new_artifact_is_newest() {
    // Given: An artifact from a previous store instance
    let temp = TempDir::new().unwrap();
    let old = FsVideoStore::open(temp.path())
        .await
        .unwrap()
        .save(vec![1])
        .await
        .unwrap();
    let store = FsVideoStore::open(temp.path()).await.unwrap();
    store.list_all().await.unwrap();

    // When: Saving again
    let new = store.save(vec![2]).await.unwrap();

    // Then: The new one sorts first
    assert!(new.created_at > old.created_at);
    assert_eq!(store.list_all().await.unwrap()[0].id, new.id);
}

/// WHAT: Deleting removes both files and repeating it is harmless
/// WHY: Delete must be idempotent so cleanup can be retried
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_saved_artifact_when_deleting_twice_then_gone_and_no_error() {
    // Given: A saved artifact
    let temp = TempDir::new().unwrap();
    let store = FsVideoStore::open(temp.path()).await.unwrap();
    let artifact = store.save(vec![9; 16]).await.unwrap();

    // When: Deleting it twice
    store.delete_by_id(artifact.id).await.unwrap();
    let again = store.delete_by_id(artifact.id).await;

    // Then: No error and no files remain
    assert!(again.is_ok());
    assert!(store.list_all().await.unwrap().is_empty());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

/// WHAT: Deleting an id that never existed succeeds
/// WHY: Absent ids are not an error
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unknown_id_when_deleting_then_ok() {
    // Given: An empty store
    let temp = TempDir::new().unwrap();
    let store = FsVideoStore::open(temp.path()).await.unwrap();

    // When/Then: Deleting an unknown id is fine
    assert!(store.delete_by_id(Uuid::new_v4()).await.is_ok());
}

/// WHAT: Corrupt metadata and orphaned payloads are skipped
/// WHY: One damaged entry must not hide the good artifact
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_damaged_entries_when_listing_then_only_valid_artifact_returned() {
    // Given: A good artifact plus garbage metadata and a stray payload
    let temp = TempDir::new().unwrap();
    let store = FsVideoStore::open(temp.path()).await.unwrap();
    let good = store.save(vec![5, 6, 7]).await.unwrap();
    std::fs::write(temp.path().join("broken.toml"), "this is = = not toml").unwrap();
    std::fs::write(temp.path().join(format!("{}.clip", Uuid::new_v4())), [1, 2]).unwrap();

    // When: Listing
    let listed = store.list_all().await.unwrap();

    // Then: Only the good artifact appears
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, good.id);
}

/// WHAT: A payload shorter than its metadata says is skipped
/// WHY: A torn write must not be presented as a complete recording
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_truncated_payload_when_listing_then_artifact_skipped() {
    // Given: A saved artifact whose payload was cut short
    let temp = TempDir::new().unwrap();
    let store = FsVideoStore::open(temp.path()).await.unwrap();
    let artifact = store.save(vec![1, 2, 3, 4]).await.unwrap();
    std::fs::write(temp.path().join(format!("{}.clip", artifact.id)), [1, 2]).unwrap();

    // When: Listing
    let listed = store.list_all().await.unwrap();

    // Then: Nothing is reported
    assert!(listed.is_empty());
}

/// WHAT: Opening over a regular file fails as storage unavailable
/// WHY: Startup reports an unusable directory instead of guessing
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_file_path_when_opening_then_storage_unavailable() {
    // Given: A path that is a regular file
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not-a-dir");
    std::fs::write(&file_path, b"x").unwrap();

    // When: Opening the store there
    let result = FsVideoStore::open(&file_path).await;

    // Then: Storage is unavailable
    assert!(matches!(result, Err(RecorderError::StorageUnavailable { .. })));
}

/// WHAT: Opening creates nested directories and can be repeated
/// WHY: First launch starts without the data directory
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_missing_directory_when_opening_twice_then_both_succeed() {
    // Given: A nested path that does not exist
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("data").join("clips");

    // When: Opening twice
    let first = FsVideoStore::open(&dir).await.unwrap();
    let second = FsVideoStore::open(&dir).await;

    // Then: Both succeed on the same directory
    assert!(second.is_ok());
    assert!(first.directory().is_dir());
}

/// WHAT: A store over an unusable path fails per operation and recovers
/// WHY: The app stays usable when storage is missing at startup
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_blocked_directory_when_using_store_then_fails_until_path_clears() {
    // Given: A store whose directory path is occupied by a regular file
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("clips");
    std::fs::write(&dir, b"x").unwrap();
    let store = FsVideoStore::new(&dir);

    // When: Listing and saving
    let listed = store.list_all().await;
    let saved = store.save(vec![1]).await;

    // Then: Both report unavailable storage
    assert!(matches!(listed, Err(RecorderError::StorageUnavailable { .. })));
    assert!(matches!(saved, Err(RecorderError::StorageUnavailable { .. })));

    // When: The file goes away
    std::fs::remove_file(&dir).unwrap();
    let saved = store.save(vec![2]).await.unwrap();

    // Then: The store works
    assert_eq!(store.list_all().await.unwrap(), vec![saved]);
}

/// WHAT: A failed atomic write leaves no temp file behind
/// WHY: Partial files would accumulate in the store directory
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_rename_target_is_directory_when_writing_then_temp_file_removed() {
    // Given: A target path occupied by a non-empty directory
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("entry.clip");
    std::fs::create_dir(&target).unwrap();
    std::fs::write(target.join("inner"), b"x").unwrap();

    // When: Writing atomically to it
    let result = write_atomic(&target, b"payload").await;

    // Then: The write fails and only the directory remains
    assert!(result.is_err());
    assert!(!temp.path().join("entry.clip.tmp").exists());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
}
