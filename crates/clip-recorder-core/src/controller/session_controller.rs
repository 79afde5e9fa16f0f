use crate::{
    capture::{CaptureSession, MediaDevices},
    controller::{Phase, SessionSnapshot},
    error::{RecorderError, SAVE_FAILED_MESSAGE},
    store::{VideoArtifact, VideoStore},
};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Orchestrates capture and storage, keeping at most one artifact.
///
/// The controller is the only component that touches both the store and
/// the capture session. Every trigger takes `&mut self`, returns the state
/// it left behind, and publishes that state to subscribers before
/// returning.
///
/// The phase is derived rather than stored:
///
/// - `Initializing` until [`SessionController::initialize`] completes
/// - `Recording` exactly while the capture session holds a stream
/// - `Error` while `last_error` is set
/// - otherwise `IdleHasArtifact` or `IdleNoArtifact`
pub struct SessionController<S: VideoStore, D: MediaDevices> {
    store: S,
    capture: CaptureSession<D>,
    artifact: Option<Arc<VideoArtifact>>,
    last_error: Option<String>,
    retryable: bool,
    initializing: bool,
    reload_pending: bool,
    permission_known: bool,
    observers: watch::Sender<SessionSnapshot>,
}

impl<S: VideoStore, D: MediaDevices> SessionController<S, D> {
    /// Creates a controller in the initializing phase.
    pub fn new(store: S, capture: CaptureSession<D>) -> Self {
        let (observers, _) = watch::channel(SessionSnapshot::initializing());

        Self {
            store,
            capture,
            artifact: None,
            last_error: None,
            retryable: false,
            initializing: true,
            reload_pending: false,
            permission_known: false,
            observers,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        if self.initializing {
            Phase::Initializing
        } else if self.capture.is_active() {
            Phase::Recording
        } else if self.last_error.is_some() {
            Phase::Error
        } else if self.artifact.is_some() {
            Phase::IdleHasArtifact
        } else {
            Phase::IdleNoArtifact
        }
    }

    /// Currently loaded artifact.
    pub fn artifact(&self) -> Option<&Arc<VideoArtifact>> {
        self.artifact.as_ref()
    }

    /// User-facing description of the last failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether device access was verified outside of recording.
    pub fn permission_known(&self) -> bool {
        self.permission_known
    }

    /// The capture session, for binding a preview to its stream.
    pub fn capture(&self) -> &CaptureSession<D> {
        &self.capture
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            artifact: self.artifact.clone(),
            last_error: self.last_error.clone(),
            retryable: self.retryable,
            permission_known: self.permission_known,
        }
    }

    /// Receiver that observes every published transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.observers.subscribe()
    }

    /// Loads the newest stored artifact and leaves the initializing phase.
    ///
    /// A failed load is logged and treated as an empty store. Older
    /// artifacts left behind by an interrupted replacement are pruned.
    #[instrument(skip(self))]
    pub async fn initialize(&mut self) -> SessionSnapshot {
        if !self.initializing {
            debug!("Controller already initialized");
            return self.snapshot();
        }

        match self.store.list_all().await {
            Ok(artifacts) => {
                let mut artifacts = artifacts.into_iter();
                self.artifact = artifacts.next().map(Arc::new);

                for stale in artifacts {
                    match self.store.delete_by_id(stale.id).await {
                        Ok(()) => info!(id = %stale.id, "Pruned superseded artifact"),
                        Err(e) => warn!(id = %stale.id, error = ?e, "Failed to prune superseded artifact"),
                    }
                }
            }
            Err(e) => {
                error!(error = ?e, "Failed to load stored artifact, starting empty");
                self.reload_pending = true;
            }
        }

        self.initializing = false;
        info!(
            phase = %self.phase(),
            artifact_id = ?self.artifact.as_ref().map(|a| a.id),
            "Session initialized"
        );

        self.publish()
    }

    /// Starts a recording.
    ///
    /// Rejected while initializing or already recording. A device failure
    /// moves the session to the error phase with the artifact untouched.
    #[instrument(skip(self))]
    pub async fn start_recording(&mut self) -> SessionSnapshot {
        match self.phase() {
            Phase::Initializing | Phase::Recording => {
                warn!(phase = %self.phase(), "Start ignored");
                return self.snapshot();
            }
            Phase::IdleNoArtifact | Phase::IdleHasArtifact | Phase::Error => {}
        }

        self.clear_error();

        match self.capture.start().await {
            Ok(_) => {
                self.permission_known = true;
                info!("Recording started");
            }
            Err(e) => {
                error!(error = ?e, "Failed to start recording");
                self.set_error(e.user_message(), &e);
            }
        }

        self.publish()
    }

    /// Stops the recording and replaces the stored artifact with it.
    ///
    /// The previous artifact is deleted first; failing to delete it is
    /// logged and does not stop the new one from being saved. A failed save
    /// loses the recording but never leaves a device held.
    #[instrument(skip(self))]
    pub async fn stop_recording(&mut self) -> SessionSnapshot {
        if !self.capture.is_active() {
            debug!("Stop ignored: not recording");
            return self.snapshot();
        }

        self.clear_error();

        let payload = match self.capture.stop().await {
            Ok(Some(payload)) => payload,
            Ok(None) => return self.publish(),
            Err(e) => {
                error!(error = ?e, "Failed to finalize recording");
                self.set_error(e.user_message(), &e);
                return self.publish();
            }
        };

        if self.reload_pending {
            self.prune_unlisted().await;
        }

        if let Some(previous) = self.artifact.as_ref().map(|a| a.id) {
            match self.store.delete_by_id(previous).await {
                Ok(()) => {
                    debug!(id = %previous, "Previous artifact deleted");
                    self.artifact = None;
                }
                Err(e) => {
                    warn!(id = %previous, error = ?e, "Failed to delete previous artifact, continuing");
                }
            }
        }

        match self.store.save(payload).await {
            Ok(saved) => {
                info!(id = %saved.id, size_bytes = saved.size_bytes(), "Recording saved");
                self.artifact = Some(Arc::new(saved));
            }
            Err(e) => {
                error!(error = ?e, "Failed to save recording");
                self.set_error(SAVE_FAILED_MESSAGE, &e);
            }
        }

        self.publish()
    }

    /// Deletes the current artifact.
    ///
    /// A no-op without an artifact. Rejected while recording. A failed
    /// delete keeps the artifact, since it is presumed still stored.
    #[instrument(skip(self))]
    pub async fn delete_artifact(&mut self) -> SessionSnapshot {
        let Some(id) = self.artifact.as_ref().map(|a| a.id) else {
            debug!("Delete ignored: no artifact");
            return self.snapshot();
        };

        if self.capture.is_active() {
            warn!(id = %id, "Delete ignored while recording");
            return self.snapshot();
        }

        self.clear_error();

        match self.store.delete_by_id(id).await {
            Ok(()) => {
                info!(id = %id, "Artifact deleted");
                self.artifact = None;
            }
            Err(e) => {
                error!(id = %id, error = ?e, "Failed to delete artifact");
            }
        }

        self.publish()
    }

    /// Verifies device access without recording.
    ///
    /// Never changes the artifact.
    #[instrument(skip(self))]
    pub async fn request_permission(&mut self) -> SessionSnapshot {
        if self.initializing {
            warn!("Permission request ignored while initializing");
            return self.snapshot();
        }

        self.clear_error();

        match self.capture.request_access().await {
            Ok(()) => {
                info!("Device permission confirmed");
                self.permission_known = true;
            }
            Err(e) => {
                error!(error = ?e, "Device permission request failed");
                self.set_error(e.user_message(), &e);
                self.permission_known = false;
            }
        }

        self.publish()
    }

    /// Removes whatever a failed startup load could not see, so the next
    /// save leaves exactly one artifact. Attempted once.
    async fn prune_unlisted(&mut self) {
        self.reload_pending = false;

        let unlisted = match self.store.list_all().await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                warn!(error = ?e, "Stored artifacts still unreadable, skipping prune");
                return;
            }
        };

        let current = self.artifact.as_ref().map(|a| a.id);
        for stale in unlisted.into_iter().filter(|a| Some(a.id) != current) {
            match self.store.delete_by_id(stale.id).await {
                Ok(()) => info!(id = %stale.id, "Pruned artifact missed at startup"),
                Err(e) => warn!(id = %stale.id, error = ?e, "Failed to prune artifact missed at startup"),
            }
        }
    }

    fn set_error(&mut self, message: &str, cause: &RecorderError) {
        self.last_error = Some(message.to_string());
        self.retryable = cause.is_retryable();
    }

    fn clear_error(&mut self) {
        self.last_error = None;
        self.retryable = false;
    }

    fn publish(&self) -> SessionSnapshot {
        let snapshot = self.snapshot();
        self.observers.send_replace(snapshot.clone());
        debug!(phase = %snapshot.phase, "Session state published");
        snapshot
    }
}
