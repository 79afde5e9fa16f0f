use crate::config::{default_finalize_timeout_ms, default_true};

use clip_recorder_core::CaptureConstraints;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Capture device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Request a camera track. The built-in host records audio only.
    #[serde(default)]
    pub video: bool,

    /// Request a microphone track.
    #[serde(default = "default_true")]
    pub audio: bool,

    /// How long stopping waits for the pipeline to flush, in milliseconds.
    #[serde(default = "default_finalize_timeout_ms")]
    pub finalize_timeout_ms: u64,
}

impl CaptureConfig {
    /// Constraints passed to every device access request.
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            video: self.video,
            audio: self.audio,
        }
    }

    /// Finalize timeout as a `Duration`.
    pub fn finalize_timeout(&self) -> Duration {
        Duration::from_millis(self.finalize_timeout_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            video: false,
            audio: true,
            finalize_timeout_ms: default_finalize_timeout_ms(),
        }
    }
}
