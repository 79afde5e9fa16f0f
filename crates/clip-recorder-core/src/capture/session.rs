use crate::{
    CoreResult, RecorderError,
    capture::{CaptureConstraints, DeviceStream, MediaDevices, RecorderEvent, RecorderHandle},
};

use std::{mem, panic::Location, time::Duration};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Default upper bound on how long `stop()` waits for the pipeline to
/// confirm finalization.
pub const DEFAULT_FINALIZE_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// No device held.
    Idle,
    /// Waiting on the host for device access.
    Acquiring,
    /// Recording into the chunk buffer.
    Active,
    /// Waiting on the pipeline to flush.
    Finalizing,
}

struct ActiveRecording<S> {
    stream: S,
    recorder: RecorderHandle,
}

/// Owns one device stream and one in-progress recording at a time.
///
/// Every method that suspends takes `&mut self`, so a second `start()` can
/// never interleave with a pending one. Callers should drive each future to
/// completion; a future dropped mid-flight leaves the phase where it was.
pub struct CaptureSession<D: MediaDevices> {
    devices: D,
    constraints: CaptureConstraints,
    finalize_timeout: Duration,
    phase: CapturePhase,
    active: Option<ActiveRecording<D::Stream>>,
    chunks: Vec<Vec<u8>>,
}

impl<D: MediaDevices> CaptureSession<D> {
    /// Creates an idle session over the given host devices.
    pub fn new(devices: D, constraints: CaptureConstraints) -> Self {
        Self {
            devices,
            constraints,
            finalize_timeout: DEFAULT_FINALIZE_TIMEOUT,
            phase: CapturePhase::Idle,
            active: None,
            chunks: Vec::new(),
        }
    }

    /// Overrides how long `stop()` waits for finalization.
    pub fn with_finalize_timeout(mut self, timeout: Duration) -> Self {
        self.finalize_timeout = timeout;
        self
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Whether a recording is in progress.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The live device stream, present only while recording.
    pub fn stream(&self) -> Option<&D::Stream> {
        self.active.as_ref().map(|active| &active.stream)
    }

    /// Tracks currently held by this session.
    pub fn active_tracks(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |active| active.stream.active_tracks())
    }

    /// Confirms device access without starting a recording.
    ///
    /// The stream obtained for the check is released before returning.
    #[instrument(skip(self))]
    pub async fn request_access(&mut self) -> CoreResult<()> {
        if self.active.is_some() {
            debug!("Access already held by the active recording");
            return Ok(());
        }
        self.ensure_idle()?;
        self.ensure_supported()?;

        self.phase = CapturePhase::Acquiring;
        let result = self.devices.request_access(self.constraints).await;
        self.phase = CapturePhase::Idle;

        match result {
            Ok(mut stream) => {
                stream.stop_all_tracks();
                info!("Device access granted");
                Ok(())
            }
            Err(failure) => {
                warn!(?failure, "Device access refused");
                Err(RecorderError::from_device_failure(failure))
            }
        }
    }

    /// Acquires the devices and starts recording.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> CoreResult<&D::Stream> {
        self.ensure_idle()?;
        self.ensure_supported()?;

        self.phase = CapturePhase::Acquiring;
        let mut stream = match self.devices.request_access(self.constraints).await {
            Ok(stream) => stream,
            Err(failure) => {
                self.phase = CapturePhase::Idle;
                warn!(?failure, "Device access refused");
                return Err(RecorderError::from_device_failure(failure));
            }
        };

        let recorder = match self.devices.start_recorder(&mut stream).await {
            Ok(recorder) => recorder,
            Err(failure) => {
                stream.stop_all_tracks();
                self.phase = CapturePhase::Idle;
                warn!(?failure, "Recording pipeline failed to start");
                return Err(RecorderError::from_device_failure(failure));
            }
        };

        self.chunks.clear();
        self.phase = CapturePhase::Active;
        info!(tracks = stream.active_tracks(), "Capture started");

        let active = self.active.insert(ActiveRecording { stream, recorder });
        Ok(&active.stream)
    }

    /// Finalizes the recording and returns the payload.
    ///
    /// Returns `Ok(None)` when nothing is recording. Every track is
    /// released whether or not finalization succeeds.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> CoreResult<Option<Vec<u8>>> {
        let Some(ActiveRecording {
            mut stream,
            mut recorder,
        }) = self.active.take()
        else {
            debug!("Stop requested with no active recording");
            return Ok(None);
        };

        self.phase = CapturePhase::Finalizing;
        recorder.request_stop();

        let outcome = tokio::time::timeout(
            self.finalize_timeout,
            collect_chunks(&mut recorder, &mut self.chunks),
        )
        .await;

        stream.stop_all_tracks();
        let chunks = mem::take(&mut self.chunks);
        self.phase = CapturePhase::Idle;

        let reason = match outcome {
            Ok(Ok(())) => {
                let payload = chunks.concat();
                info!(
                    chunk_count = chunks.len(),
                    payload_len = payload.len(),
                    "Capture finalized"
                );
                return Ok(Some(payload));
            }
            Ok(Err(reason)) => reason,
            Err(_) => format!(
                "no finalize confirmation within {} ms",
                self.finalize_timeout.as_millis()
            ),
        };

        warn!(reason = %reason, discarded_chunks = chunks.len(), "Capture finalization failed");
        Err(RecorderError::FinalizeFailed {
            reason,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn ensure_idle(&self) -> CoreResult<()> {
        if self.phase != CapturePhase::Idle || self.active.is_some() {
            return Err(RecorderError::CaptureBusy {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    #[track_caller]
    fn ensure_supported(&self) -> CoreResult<()> {
        if !self.devices.supports_recording() {
            return Err(RecorderError::UnsupportedEnvironment {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

/// Buffers chunks in arrival order until the pipeline confirms.
async fn collect_chunks(
    recorder: &mut RecorderHandle,
    chunks: &mut Vec<Vec<u8>>,
) -> Result<(), String> {
    loop {
        match recorder.next_event().await {
            Some(RecorderEvent::Chunk(chunk)) => {
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }
            }
            Some(RecorderEvent::Finalized) => return Ok(()),
            Some(RecorderEvent::Failed(reason)) => return Err(reason),
            None => return Err("pipeline closed before finalizing".to_string()),
        }
    }
}
