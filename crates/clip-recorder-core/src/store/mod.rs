pub(crate) mod fs_store;

pub use fs_store::FsVideoStore;

use crate::CoreResult;

use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use uuid::Uuid;

/// One stored recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoArtifact {
    /// Identifier generated at save time.
    pub id: Uuid,
    /// Milliseconds since the Unix epoch; strictly increasing per store.
    pub created_at: u64,
    /// Recorded bytes in the capture host's container format.
    pub payload: Vec<u8>,
}

impl VideoArtifact {
    /// Payload length in bytes.
    pub fn size_bytes(&self) -> usize {
        self.payload.len()
    }
}

/// Durable keyed storage of video artifacts.
///
/// Every operation is a suspension point. The store itself may hold many
/// artifacts; keeping only one is the controller's job.
pub trait VideoStore: Send + Sync {
    /// Writes `payload` under a fresh id and timestamp.
    fn save(&self, payload: Vec<u8>) -> impl Future<Output = CoreResult<VideoArtifact>> + Send;

    /// Every stored artifact, newest first.
    fn list_all(&self) -> impl Future<Output = CoreResult<Vec<VideoArtifact>>> + Send;

    /// Removes the artifact with `id`. Absent ids are not an error.
    fn delete_by_id(&self, id: Uuid) -> impl Future<Output = CoreResult<()>> + Send;
}

/// Wall-clock milliseconds that never repeat or go backwards.
#[derive(Debug, Default)]
pub(crate) struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    /// Next timestamp, at least one millisecond after every earlier one.
    pub(crate) fn next(&self) -> u64 {
        let now = now_millis();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return candidate,
                Err(current) => last = current,
            }
        }
    }

    /// Records a timestamp seen in storage so later ones sort after it.
    pub(crate) fn observe(&self, timestamp: u64) {
        self.last.fetch_max(timestamp, Ordering::AcqRel);
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
