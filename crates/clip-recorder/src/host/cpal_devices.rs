use crate::host::wav;

use clip_recorder_core::{
    CaptureConstraints, DeviceFailure, DeviceStream, MediaDevices, RecorderHandle, RecorderSink,
    recorder_channel,
};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use cpal::{
    BuildStreamError, DefaultStreamConfigError, Device, InputCallbackInfo, PlayStreamError,
    SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

/// Microphone access through the default cpal host.
///
/// Audio only: a request that needs a camera is unsatisfiable.
#[derive(Debug, Default)]
pub struct CpalDevices;

impl CpalDevices {
    pub fn new() -> Self {
        Self
    }
}

/// The default input device, held until its track is stopped.
pub struct CpalStream {
    device: Device,
    config: SupportedStreamConfig,
    released: Arc<AtomicBool>,
}

impl DeviceStream for CpalStream {
    fn active_tracks(&self) -> usize {
        if self.released.load(Ordering::Acquire) {
            0
        } else {
            1
        }
    }

    fn stop_all_tracks(&mut self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            debug!(device_id = ?self.device.id(), "Input track stopped");
        }
    }
}

impl MediaDevices for CpalDevices {
    type Stream = CpalStream;

    fn supports_recording(&self) -> bool {
        cpal::default_host().input_devices().is_ok()
    }

    /// Opens and plays the default input once, so the OS permission check
    /// and device contention surface here rather than at record time.
    #[instrument(skip(self))]
    async fn request_access(
        &mut self,
        constraints: CaptureConstraints,
    ) -> Result<CpalStream, DeviceFailure> {
        if constraints.video || !constraints.audio {
            warn!(?constraints, "Only audio-only capture is available");
            return Err(DeviceFailure::ConstraintsUnsatisfiable);
        }

        let device = cpal::default_host()
            .default_input_device()
            .ok_or(DeviceFailure::DeviceNotFound)?;

        let config = device
            .default_input_config()
            .map_err(map_config_error)?;

        let check_device = device.clone();
        let check_config = config.clone();
        tokio::task::spawn_blocking(move || open_briefly(&check_device, &check_config))
            .await
            .map_err(|e| DeviceFailure::Other(format!("Access check task failed: {}", e)))??;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            sample_format = ?config.sample_format(),
            "Input device acquired"
        );

        Ok(CpalStream {
            device,
            config,
            released: Arc::new(AtomicBool::new(false)),
        })
    }

    #[instrument(skip(self, stream))]
    async fn start_recorder(
        &mut self,
        stream: &mut CpalStream,
    ) -> Result<RecorderHandle, DeviceFailure> {
        let (handle, sink) = recorder_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let device = stream.device.clone();
        let config = stream.config.clone();
        let released = Arc::clone(&stream.released);

        // cpal streams are driven from a thread that owns them for their whole life.
        thread::Builder::new()
            .name("clip-recorder-pipeline".to_string())
            .spawn(move || run_pipeline(device, config, released, sink, ready_tx))
            .map_err(|e| DeviceFailure::Other(format!("Failed to spawn pipeline thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(failure)) => Err(failure),
            Err(_) => Err(DeviceFailure::Other(
                "Pipeline thread exited before starting".to_string(),
            )),
        }
    }
}

/// Builds and plays a stream that discards its input, then drops it.
fn open_briefly(device: &Device, config: &SupportedStreamConfig) -> Result<(), DeviceFailure> {
    let stream_config = config.config();

    let stream = match config.sample_format() {
        SampleFormat::F32 => {
            open_input::<f32, _>(device, &stream_config, |_: &[f32], _: &InputCallbackInfo| {})?
        }
        SampleFormat::I16 => {
            open_input::<i16, _>(device, &stream_config, |_: &[i16], _: &InputCallbackInfo| {})?
        }
        other => {
            warn!(sample_format = ?other, "Unsupported input sample format");
            return Err(DeviceFailure::CapabilityUnsupported);
        }
    };

    stream.play().map_err(map_play_error)?;
    drop(stream);

    debug!("Input device opened and released");
    Ok(())
}

fn open_input<T, F>(device: &Device, config: &StreamConfig, on_data: F) -> Result<Stream, DeviceFailure>
where
    T: SizedSample,
    F: FnMut(&[T], &InputCallbackInfo) + Send + 'static,
{
    device
        .build_input_stream(
            config,
            on_data,
            |err: cpal::StreamError| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(map_build_error)
}

fn run_pipeline(
    device: Device,
    config: SupportedStreamConfig,
    released: Arc<AtomicBool>,
    mut sink: RecorderSink,
    ready: oneshot::Sender<Result<(), DeviceFailure>>,
) {
    let stream_config = config.config();
    let sender = sink.chunk_sender();

    sink.emit_chunk(wav::streaming_header(config.sample_rate(), config.channels()));

    let built = match config.sample_format() {
        SampleFormat::F32 => {
            let released = Arc::clone(&released);
            open_input::<f32, _>(&device, &stream_config, move |data: &[f32], _: &InputCallbackInfo| {
                if !released.load(Ordering::Acquire) {
                    sender.send(wav::encode_f32(data));
                }
            })
        }
        SampleFormat::I16 => {
            let released = Arc::clone(&released);
            open_input::<i16, _>(&device, &stream_config, move |data: &[i16], _: &InputCallbackInfo| {
                if !released.load(Ordering::Acquire) {
                    sender.send(wav::encode_i16(data));
                }
            })
        }
        other => {
            warn!(sample_format = ?other, "Unsupported input sample format");
            Err(DeviceFailure::CapabilityUnsupported)
        }
    };

    let stream = match built {
        Ok(stream) => stream,
        Err(failure) => {
            let _ = ready.send(Err(failure));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(map_play_error(e)));
        return;
    }

    if ready.send(Ok(())).is_err() {
        return;
    }

    info!("Recording pipeline running");

    sink.blocking_stop_requested();

    // Dropping the stream joins the callback, so no chunk can follow the
    // finalize event.
    drop(stream);
    sink.finalize();

    info!("Recording pipeline finalized");
}

fn map_config_error(e: DefaultStreamConfigError) -> DeviceFailure {
    match e {
        DefaultStreamConfigError::DeviceNotAvailable => DeviceFailure::DeviceNotFound,
        DefaultStreamConfigError::StreamTypeNotSupported => DeviceFailure::CapabilityUnsupported,
        DefaultStreamConfigError::BackendSpecific { err } => classify_backend_error(&err.description),
    }
}

pub(crate) fn map_build_error(e: BuildStreamError) -> DeviceFailure {
    match e {
        BuildStreamError::DeviceNotAvailable => DeviceFailure::DeviceNotFound,
        BuildStreamError::StreamConfigNotSupported => DeviceFailure::ConstraintsUnsatisfiable,
        BuildStreamError::BackendSpecific { err } => classify_backend_error(&err.description),
        other => DeviceFailure::Other(other.to_string()),
    }
}

pub(crate) fn map_play_error(e: PlayStreamError) -> DeviceFailure {
    match e {
        PlayStreamError::DeviceNotAvailable => DeviceFailure::DeviceBusy,
        PlayStreamError::BackendSpecific { err } => classify_backend_error(&err.description),
    }
}

/// Maps a backend's free-text error onto the failure taxonomy.
///
/// Backends report OS permission refusals and exclusive-use conflicts only
/// as descriptions, so the wording is all there is to go on.
pub(crate) fn classify_backend_error(description: &str) -> DeviceFailure {
    let lower = description.to_lowercase();

    if ["permission", "not permitted", "access denied", "unauthorized"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        DeviceFailure::PermissionDenied
    } else if ["busy", "in use", "exclusive"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        DeviceFailure::DeviceBusy
    } else {
        DeviceFailure::Other(description.to_string())
    }
}
