//! Directory-backed artifact store.
//!
//! Each artifact is two files: `<id>.clip` holds the payload and
//! `<id>.toml` holds its metadata. Metadata is written last and is what
//! listing looks for, so a payload without metadata is never reported.
//!
//! The directory is checked on every save and listing, so a store that
//! was unavailable at startup starts working once the directory can be
//! created.

use crate::{
    CoreResult, RecorderError,
    store::{MonotonicClock, VideoArtifact, VideoStore},
};

use std::{
    io::ErrorKind,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const PAYLOAD_EXTENSION: &str = "clip";
const METADATA_EXTENSION: &str = "toml";

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactMetadata {
    id: Uuid,
    created_at_ms: u64,
    size_bytes: u64,
}

/// Artifact store rooted at one directory.
#[derive(Debug)]
pub struct FsVideoStore {
    dir: PathBuf,
    clock: MonotonicClock,
}

impl FsVideoStore {
    /// Store rooted at `dir`, without touching the filesystem yet.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            clock: MonotonicClock::default(),
        }
    }

    /// Opens the store, creating its directory on first use.
    ///
    /// Opening the same directory again is harmless.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the directory cannot be created or
    /// the path is not a directory.
    #[instrument(skip(dir))]
    pub async fn open<P: AsRef<Path>>(dir: P) -> CoreResult<Self> {
        let store = Self::new(dir);
        store.ensure_dir().await?;

        info!(dir = %store.dir.display(), "Artifact store opened");

        Ok(store)
    }

    /// Creates the store directory if needed and checks it is a directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` when the directory cannot be used.
    pub async fn ensure_dir(&self) -> CoreResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RecorderError::StorageUnavailable {
                reason: format!("Failed to create {}: {}", self.dir.display(), e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let metadata = fs::metadata(&self.dir)
            .await
            .map_err(|e| RecorderError::StorageUnavailable {
                reason: format!("Failed to inspect {}: {}", self.dir.display(), e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if !metadata.is_dir() {
            return Err(RecorderError::StorageUnavailable {
                reason: format!("{} is not a directory", self.dir.display()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }

    /// Root directory of the store.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    fn payload_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.{PAYLOAD_EXTENSION}"))
    }

    fn metadata_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.{METADATA_EXTENSION}"))
    }

    async fn read_artifact(&self, metadata_path: &Path) -> CoreResult<Option<VideoArtifact>> {
        let text = match fs::read_to_string(metadata_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RecorderError::ReadFailed {
                    reason: format!("Failed to read {}: {}", metadata_path.display(), e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let metadata: ArtifactMetadata = match toml::from_str(&text) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %metadata_path.display(), error = %e, "Skipping corrupt artifact metadata");
                return Ok(None);
            }
        };

        let payload_path = self.payload_path(metadata.id);
        let payload = match fs::read(&payload_path).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(id = %metadata.id, "Skipping artifact with missing payload");
                return Ok(None);
            }
            Err(e) => {
                return Err(RecorderError::ReadFailed {
                    reason: format!("Failed to read {}: {}", payload_path.display(), e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        if payload.len() as u64 != metadata.size_bytes {
            warn!(
                id = %metadata.id,
                expected = metadata.size_bytes,
                actual = payload.len(),
                "Skipping artifact with truncated payload"
            );
            return Ok(None);
        }

        Ok(Some(VideoArtifact {
            id: metadata.id,
            created_at: metadata.created_at_ms,
            payload,
        }))
    }
}

impl VideoStore for FsVideoStore {
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    async fn save(&self, payload: Vec<u8>) -> CoreResult<VideoArtifact> {
        self.ensure_dir().await?;

        let id = Uuid::new_v4();
        let created_at = self.clock.next();
        let payload_path = self.payload_path(id);

        write_atomic(&payload_path, &payload)
            .await
            .map_err(|e| RecorderError::WriteFailed {
                reason: format!("Failed to write {}: {}", payload_path.display(), e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let metadata = ArtifactMetadata {
            id,
            created_at_ms: created_at,
            size_bytes: payload.len() as u64,
        };

        let committed = match toml::to_string(&metadata) {
            Ok(text) => write_atomic(&self.metadata_path(id), text.as_bytes())
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(reason) = committed {
            // Without metadata the payload is unreachable; drop it.
            if let Err(e) = fs::remove_file(&payload_path).await {
                warn!(path = %payload_path.display(), error = %e, "Failed to remove orphaned payload");
            }
            return Err(RecorderError::WriteFailed {
                reason: format!("Failed to write metadata for {id}: {reason}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!(id = %id, created_at, payload_len = payload.len(), "Artifact saved");

        Ok(VideoArtifact {
            id,
            created_at,
            payload,
        })
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> CoreResult<Vec<VideoArtifact>> {
        self.ensure_dir().await?;

        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| RecorderError::ReadFailed {
                reason: format!("Failed to list {}: {}", self.dir.display(), e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut artifacts = Vec::new();

        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|e| RecorderError::ReadFailed {
                    reason: format!("Failed to list {}: {}", self.dir.display(), e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let Some(entry) = entry else {
                break;
            };

            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(METADATA_EXTENSION) {
                continue;
            }

            if let Some(artifact) = self.read_artifact(&path).await? {
                self.clock.observe(artifact.created_at);
                artifacts.push(artifact);
            }
        }

        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(count = artifacts.len(), "Artifacts listed");

        Ok(artifacts)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> CoreResult<()> {
        // Metadata first: once it is gone the artifact no longer lists.
        for path in [self.metadata_path(id), self.payload_path(id)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(RecorderError::DeleteFailed {
                        reason: format!("Failed to remove {}: {}", path.display(), e),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }

        info!(id = %id, "Artifact deleted");

        Ok(())
    }
}

/// Writes to a sibling temp file, syncs, then renames over `path`.
///
/// The temp file is removed when any step fails.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let temp_path = temp_path(path);

    let result = write_then_rename(&temp_path, path, contents).await;

    if result.is_err() {
        match fs::remove_file(&temp_path).await {
            Ok(()) => debug!(path = %temp_path.display(), "Removed partial temp file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file"),
        }
    }

    result
}

async fn write_then_rename(temp_path: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, path).await
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    PathBuf::from(temp_name)
}
