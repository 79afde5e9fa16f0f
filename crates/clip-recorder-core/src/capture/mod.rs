mod device;
mod session;

pub use {
    device::{
        CaptureConstraints, ChunkSender, DeviceFailure, DeviceStream, MediaDevices,
        RecorderEvent, RecorderHandle, RecorderSink, recorder_channel,
    },
    session::{CapturePhase, CaptureSession, DEFAULT_FINALIZE_TIMEOUT},
};
