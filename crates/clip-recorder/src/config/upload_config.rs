use crate::config::{
    default_failure_threshold_max, default_failure_threshold_min, default_step_max,
    default_step_min, default_tick_ms,
};

use clip_recorder_core::UploadSettings;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Simulated upload configuration.
///
/// A failure threshold above 100 lets uploads succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Interval between progress ticks, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Lowest percent at which an upload may fail.
    #[serde(default = "default_failure_threshold_min")]
    pub failure_threshold_min: u32,

    /// Highest percent at which an upload may fail.
    #[serde(default = "default_failure_threshold_max")]
    pub failure_threshold_max: u32,

    /// Smallest per-tick increment.
    #[serde(default = "default_step_min")]
    pub step_min: u32,

    /// Largest per-tick increment.
    #[serde(default = "default_step_max")]
    pub step_max: u32,
}

impl UploadConfig {
    /// Simulator settings built from this section.
    pub fn settings(&self) -> UploadSettings {
        UploadSettings {
            tick: Duration::from_millis(self.tick_ms),
            failure_threshold: self.failure_threshold_min..=self.failure_threshold_max,
            step: self.step_min..=self.step_max,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            failure_threshold_min: default_failure_threshold_min(),
            failure_threshold_max: default_failure_threshold_max(),
            step_min: default_step_min(),
            step_max: default_step_max(),
        }
    }
}
