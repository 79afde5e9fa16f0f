//! Clip Recorder Core Library
//!
//! Single-clip recording session: a capture session over host devices, a
//! persistent artifact store, the controller that keeps at most one
//! artifact stored, and a simulated upload.
//!
//! # Example
//!
//! ```no_run
//! use clip_recorder_core::{
//!     CaptureConstraints, CaptureSession, CoreResult, FsVideoStore, MediaDevices,
//!     SessionController,
//! };
//!
//! async fn record_once<D: MediaDevices>(devices: D) -> CoreResult<()> {
//!     let store = FsVideoStore::open("clips").await?;
//!     let capture = CaptureSession::new(devices, CaptureConstraints::default());
//!     let mut controller = SessionController::new(store, capture);
//!
//!     controller.initialize().await;
//!     controller.start_recording().await;
//!     let state = controller.stop_recording().await;
//!
//!     println!("Phase after stop: {}", state.phase);
//!     Ok(())
//! }
//! ```

mod capture;
mod controller;
mod error;
mod store;
mod upload;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use {
    capture::{
        CaptureConstraints, CapturePhase, CaptureSession, ChunkSender, DEFAULT_FINALIZE_TIMEOUT,
        DeviceFailure, DeviceStream, MediaDevices, RecorderEvent, RecorderHandle, RecorderSink,
        recorder_channel,
    },
    controller::{Phase, SessionController, SessionSnapshot},
    error::{RecorderError, Result as CoreResult, SAVE_FAILED_MESSAGE},
    store::{FsVideoStore, VideoArtifact, VideoStore},
    upload::{
        TickOutcome, UPLOAD_FAILED_MESSAGE, UploadProgress, UploadSettings, UploadSimulator,
        UploadStatus, advance,
    },
};
