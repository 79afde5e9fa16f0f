use crate::{
    CoreResult, RecorderError,
    store::{MonotonicClock, VideoArtifact, VideoStore},
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use error_location::ErrorLocation;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    artifacts: Mutex<Vec<VideoArtifact>>,
    clock: MonotonicClock,
    fail_save: AtomicBool,
    fail_list: AtomicBool,
    fail_delete: AtomicBool,
    delete_calls: AtomicUsize,
}

/// In-memory [`VideoStore`] with switchable failures.
///
/// Clones share the same contents, so a test can keep a handle after
/// moving the store into a controller.
#[derive(Debug, Clone, Default)]
pub struct MemoryVideoStore {
    inner: Arc<Inner>,
}

impl MemoryVideoStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an artifact directly, bypassing failure switches.
    pub fn seed(&self, payload: Vec<u8>) -> VideoArtifact {
        let artifact = VideoArtifact {
            id: Uuid::new_v4(),
            created_at: self.inner.clock.next(),
            payload,
        };
        self.artifacts().push(artifact.clone());
        artifact
    }

    /// Ids currently stored, in insertion order.
    pub fn ids(&self) -> Vec<Uuid> {
        self.artifacts().iter().map(|artifact| artifact.id).collect()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.artifacts().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.artifacts().is_empty()
    }

    /// Whether an artifact with `id` is stored.
    pub fn contains(&self, id: Uuid) -> bool {
        self.artifacts().iter().any(|artifact| artifact.id == id)
    }

    /// Makes every `save` fail while set.
    pub fn set_fail_save(&self, fail: bool) {
        self.inner.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Makes every `list_all` fail while set.
    pub fn set_fail_list(&self, fail: bool) {
        self.inner.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Makes every `delete_by_id` fail while set.
    pub fn set_fail_delete(&self, fail: bool) {
        self.inner.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Number of `delete_by_id` calls so far, failed ones included.
    pub fn delete_calls(&self) -> usize {
        self.inner.delete_calls.load(Ordering::SeqCst)
    }

    fn artifacts(&self) -> MutexGuard<'_, Vec<VideoArtifact>> {
        self.inner
            .artifacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl VideoStore for MemoryVideoStore {
    async fn save(&self, payload: Vec<u8>) -> CoreResult<VideoArtifact> {
        tokio::task::yield_now().await;

        if self.inner.fail_save.load(Ordering::SeqCst) {
            return Err(RecorderError::WriteFailed {
                reason: "quota exceeded".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let artifact = VideoArtifact {
            id: Uuid::new_v4(),
            created_at: self.inner.clock.next(),
            payload,
        };
        self.artifacts().push(artifact.clone());
        Ok(artifact)
    }

    async fn list_all(&self) -> CoreResult<Vec<VideoArtifact>> {
        tokio::task::yield_now().await;

        if self.inner.fail_list.load(Ordering::SeqCst) {
            return Err(RecorderError::ReadFailed {
                reason: "transaction aborted".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut artifacts = self.artifacts().clone();
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(artifacts)
    }

    async fn delete_by_id(&self, id: Uuid) -> CoreResult<()> {
        tokio::task::yield_now().await;
        self.inner.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail_delete.load(Ordering::SeqCst) {
            return Err(RecorderError::DeleteFailed {
                reason: "transaction aborted".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.artifacts().retain(|artifact| artifact.id != id);
        Ok(())
    }
}
