mod progress;
mod simulator;

pub use {
    progress::{TickOutcome, UPLOAD_FAILED_MESSAGE, UploadProgress, UploadStatus, advance},
    simulator::{UploadSettings, UploadSimulator},
};
