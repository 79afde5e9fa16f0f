use crate::capture::{
    CaptureConstraints, DeviceFailure, DeviceStream, MediaDevices, RecorderHandle, RecorderSink,
    recorder_channel,
};

use std::{
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// How a fake pipeline ends once stop is requested.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FinalizeBehavior {
    /// Deliver trailing chunks, then confirm.
    #[default]
    Finalize,
    /// Report a failure instead of confirming.
    Fail(String),
    /// Drop the sink without a terminal event.
    Close,
    /// Never respond.
    Hang,
}

#[derive(Debug)]
struct Script {
    supports_recording: bool,
    access_failure: Option<DeviceFailure>,
    recorder_failure: Option<DeviceFailure>,
    tracks_per_stream: usize,
    chunks: Vec<Vec<u8>>,
    chunk_jitter: Vec<Duration>,
    trailing_chunks: Vec<Vec<u8>>,
    finalize: FinalizeBehavior,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            supports_recording: true,
            access_failure: None,
            recorder_failure: None,
            tracks_per_stream: 2,
            chunks: Vec::new(),
            chunk_jitter: Vec::new(),
            trailing_chunks: Vec::new(),
            finalize: FinalizeBehavior::Finalize,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<Script>,
    live_tracks: Arc<AtomicUsize>,
    access_requests: AtomicUsize,
    last_constraints: Mutex<Option<CaptureConstraints>>,
}

/// Scripted [`MediaDevices`] that counts the tracks it hands out.
///
/// Clones share the script and the counters.
#[derive(Debug, Clone, Default)]
pub struct FakeDevices {
    shared: Arc<Shared>,
}

impl FakeDevices {
    /// Devices that grant access and finalize an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the host reports recording capability.
    pub fn set_supports_recording(&self, supported: bool) {
        self.script().supports_recording = supported;
    }

    /// Makes access requests fail with `failure`, or succeed with `None`.
    pub fn set_access_failure(&self, failure: Option<DeviceFailure>) {
        self.script().access_failure = failure;
    }

    /// Makes binding the recorder fail with `failure`, or succeed with `None`.
    pub fn set_recorder_failure(&self, failure: Option<DeviceFailure>) {
        self.script().recorder_failure = failure;
    }

    /// Chunks emitted while recording, each after the matching jitter delay.
    pub fn set_chunks(&self, chunks: Vec<Vec<u8>>, jitter: Vec<Duration>) {
        let mut script = self.script();
        script.chunks = chunks;
        script.chunk_jitter = jitter;
    }

    /// Chunks flushed after stop is requested and before the pipeline ends.
    pub fn set_trailing_chunks(&self, chunks: Vec<Vec<u8>>) {
        self.script().trailing_chunks = chunks;
    }

    /// How the pipeline ends once stop is requested.
    pub fn set_finalize(&self, behavior: FinalizeBehavior) {
        self.script().finalize = behavior;
    }

    /// Tracks handed out and not yet stopped, across every stream.
    pub fn live_tracks(&self) -> usize {
        self.shared.live_tracks.load(Ordering::SeqCst)
    }

    /// Number of access requests received.
    pub fn access_requests(&self) -> usize {
        self.shared.access_requests.load(Ordering::SeqCst)
    }

    /// Constraints of the latest access request.
    pub fn last_constraints(&self) -> Option<CaptureConstraints> {
        *self
            .shared
            .last_constraints
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.shared
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Stream handed out by [`FakeDevices`].
#[derive(Debug)]
pub struct FakeStream {
    tracks: usize,
    live_tracks: Arc<AtomicUsize>,
}

impl DeviceStream for FakeStream {
    fn active_tracks(&self) -> usize {
        self.tracks
    }

    fn stop_all_tracks(&mut self) {
        if self.tracks > 0 {
            self.live_tracks.fetch_sub(self.tracks, Ordering::SeqCst);
            self.tracks = 0;
        }
    }
}

impl MediaDevices for FakeDevices {
    type Stream = FakeStream;

    fn supports_recording(&self) -> bool {
        self.script().supports_recording
    }

    async fn request_access(
        &mut self,
        constraints: CaptureConstraints,
    ) -> Result<FakeStream, DeviceFailure> {
        tokio::task::yield_now().await;

        self.shared.access_requests.fetch_add(1, Ordering::SeqCst);
        *self
            .shared
            .last_constraints
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(constraints);

        let (failure, tracks) = {
            let script = self.script();
            (script.access_failure.clone(), script.tracks_per_stream)
        };

        if let Some(failure) = failure {
            return Err(failure);
        }

        self.shared.live_tracks.fetch_add(tracks, Ordering::SeqCst);
        Ok(FakeStream {
            tracks,
            live_tracks: Arc::clone(&self.shared.live_tracks),
        })
    }

    async fn start_recorder(
        &mut self,
        _stream: &mut FakeStream,
    ) -> Result<RecorderHandle, DeviceFailure> {
        let (failure, chunks, jitter, trailing, finalize) = {
            let script = self.script();
            (
                script.recorder_failure.clone(),
                script.chunks.clone(),
                script.chunk_jitter.clone(),
                script.trailing_chunks.clone(),
                script.finalize.clone(),
            )
        };

        tokio::task::yield_now().await;

        if let Some(failure) = failure {
            return Err(failure);
        }

        let (handle, sink) = recorder_channel();
        tokio::spawn(run_pipeline(sink, chunks, jitter, trailing, finalize));

        Ok(handle)
    }
}

async fn run_pipeline(
    mut sink: RecorderSink,
    chunks: Vec<Vec<u8>>,
    jitter: Vec<Duration>,
    trailing: Vec<Vec<u8>>,
    finalize: FinalizeBehavior,
) {
    for (index, chunk) in chunks.into_iter().enumerate() {
        if let Some(delay) = jitter.get(index) {
            tokio::time::sleep(*delay).await;
        }
        sink.emit_chunk(chunk);
    }

    sink.stop_requested().await;

    match finalize {
        FinalizeBehavior::Finalize => {
            for chunk in trailing {
                sink.emit_chunk(chunk);
            }
            sink.finalize();
        }
        FinalizeBehavior::Fail(reason) => sink.fail(reason),
        FinalizeBehavior::Close => drop(sink),
        FinalizeBehavior::Hang => {
            std::future::pending::<()>().await;
        }
    }
}
