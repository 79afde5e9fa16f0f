//! Host collaborators consumed by the capture session.
//!
//! A host provides device access through [`MediaDevices`] and drives a
//! recording pipeline through the [`RecorderSink`] half of a recorder
//! channel. The session keeps the [`RecorderHandle`] half.

use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

/// Reason a host gave for refusing or failing device access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFailure {
    /// The user or system refused access.
    PermissionDenied,
    /// No matching device is present.
    DeviceNotFound,
    /// The device is held by another consumer.
    DeviceBusy,
    /// Requested capture parameters cannot be met.
    ConstraintsUnsatisfiable,
    /// The host lacks the requested kind of capture.
    CapabilityUnsupported,
    /// Access blocked by transport security requirements.
    InsecureContext,
    /// Anything the host reported that does not fit the taxonomy.
    Other(String),
}

impl DeviceFailure {
    /// Classifies a host-reported error name.
    ///
    /// Accepts both the current and the legacy names hosts use for the same
    /// condition; unknown names are kept verbatim in [`DeviceFailure::Other`].
    pub fn from_reason_code(code: &str) -> Self {
        match code {
            "NotAllowedError" | "PermissionDeniedError" | "permission-denied" => {
                DeviceFailure::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" | "device-not-found" => {
                DeviceFailure::DeviceNotFound
            }
            "NotReadableError" | "TrackStartError" | "device-busy" => DeviceFailure::DeviceBusy,
            "OverconstrainedError" | "constraints-unsatisfiable" => {
                DeviceFailure::ConstraintsUnsatisfiable
            }
            "NotSupportedError" | "capability-unsupported" => DeviceFailure::CapabilityUnsupported,
            "SecurityError" | "insecure-context" => DeviceFailure::InsecureContext,
            other => DeviceFailure::Other(other.to_string()),
        }
    }
}

/// Which tracks a capture request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    /// Request a camera track.
    pub video: bool,
    /// Request a microphone track.
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// A live device stream returned by a successful access request.
pub trait DeviceStream: Send {
    /// Number of tracks still holding a device.
    fn active_tracks(&self) -> usize;

    /// Stops every track, releasing the underlying devices. Idempotent.
    fn stop_all_tracks(&mut self);
}

/// Device capture facility of the host environment.
pub trait MediaDevices: Send {
    /// Stream type handed out on successful access.
    type Stream: DeviceStream;

    /// Whether the host can record at all.
    fn supports_recording(&self) -> bool;

    /// Asks the host for access to the devices matching `constraints`.
    fn request_access(
        &mut self,
        constraints: CaptureConstraints,
    ) -> impl Future<Output = Result<Self::Stream, DeviceFailure>> + Send;

    /// Binds a recording pipeline to `stream` and starts it.
    ///
    /// The host keeps the returned [`RecorderSink`] side of a
    /// [`recorder_channel`] and hands back the [`RecorderHandle`] once the
    /// pipeline is running.
    fn start_recorder(
        &mut self,
        stream: &mut Self::Stream,
    ) -> impl Future<Output = Result<RecorderHandle, DeviceFailure>> + Send;
}

/// Events a recording pipeline delivers to the session, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// One fragment of recorded data.
    Chunk(Vec<u8>),
    /// The pipeline flushed everything it had and stopped.
    Finalized,
    /// The pipeline stopped without finalizing.
    Failed(String),
}

/// Creates the two halves of a recorder channel.
pub fn recorder_channel() -> (RecorderHandle, RecorderSink) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel();

    (
        RecorderHandle {
            events: events_rx,
            stop: Some(stop_tx),
        },
        RecorderSink {
            events: events_tx,
            stop: Some(stop_rx),
        },
    )
}

/// Session-side half of a recorder channel.
#[derive(Debug)]
pub struct RecorderHandle {
    events: mpsc::UnboundedReceiver<RecorderEvent>,
    stop: Option<oneshot::Sender<()>>,
}

impl RecorderHandle {
    /// Signals the pipeline to finalize. Only the first call has an effect.
    pub fn request_stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The pipeline may already be gone; next_event reports that.
            let _ = stop.send(());
        }
    }

    /// Waits for the next pipeline event. `None` once the pipeline dropped
    /// its sink without a terminal event.
    pub async fn next_event(&mut self) -> Option<RecorderEvent> {
        self.events.recv().await
    }
}

/// Host-side half of a recorder channel.
#[derive(Debug)]
pub struct RecorderSink {
    events: mpsc::UnboundedSender<RecorderEvent>,
    stop: Option<oneshot::Receiver<()>>,
}

impl RecorderSink {
    /// A cloneable sender for delivering chunks from capture callbacks.
    pub fn chunk_sender(&self) -> ChunkSender {
        ChunkSender {
            events: self.events.clone(),
        }
    }

    /// Delivers one chunk.
    pub fn emit_chunk(&self, chunk: Vec<u8>) {
        let _ = self.events.send(RecorderEvent::Chunk(chunk));
    }

    /// Resolves once the session asked for finalization, or dropped its
    /// handle.
    pub async fn stop_requested(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.await;
        }
    }

    /// Blocking variant of [`RecorderSink::stop_requested`] for pipelines
    /// running on their own thread. Must not be called from async code.
    pub fn blocking_stop_requested(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.blocking_recv();
        }
    }

    /// Confirms that every chunk has been delivered.
    pub fn finalize(self) {
        trace!("Recorder pipeline finalized");
        let _ = self.events.send(RecorderEvent::Finalized);
    }

    /// Reports that the pipeline stopped without finalizing.
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.events.send(RecorderEvent::Failed(reason.into()));
    }
}

/// Chunk-only sender usable from any thread.
#[derive(Debug, Clone)]
pub struct ChunkSender {
    events: mpsc::UnboundedSender<RecorderEvent>,
}

impl ChunkSender {
    /// Delivers one chunk. Returns `false` once the session is gone.
    pub fn send(&self, chunk: Vec<u8>) -> bool {
        self.events.send(RecorderEvent::Chunk(chunk)).is_ok()
    }
}
