use serde::Serialize;

/// Message reported when a simulated upload fails.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

/// Where a simulated upload stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStatus {
    /// Not started, or reset.
    #[default]
    Idle,
    /// Ticking toward 100.
    Uploading,
    /// Reached 100.
    Succeeded,
    /// Crossed the failure threshold first.
    Failed,
}

/// Observable state of the upload simulator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UploadProgress {
    /// Current status.
    pub status: UploadStatus,
    /// Percent complete, 0 to 100.
    pub percent: u32,
    /// Failure message, set only when `status` is `Failed`.
    pub error: Option<String>,
}

/// Result of one progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Progress moved to the contained value.
    Advanced(u32),
    /// The threshold was crossed; progress stays at the contained value.
    Failed(u32),
    /// Progress reached 100.
    Completed,
}

/// Applies one step of `step` percent against a failure `threshold`.
///
/// The threshold wins over completion when both are reached by the same
/// step.
pub fn advance(percent: u32, step: u32, threshold: u32) -> TickOutcome {
    let next = percent.saturating_add(step).min(100);

    if percent < threshold && next >= threshold {
        TickOutcome::Failed(percent)
    } else if next >= 100 {
        TickOutcome::Completed
    } else {
        TickOutcome::Advanced(next)
    }
}

impl UploadProgress {
    pub(crate) fn started() -> Self {
        Self {
            status: UploadStatus::Uploading,
            percent: 0,
            error: None,
        }
    }

    pub(crate) fn apply(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Advanced(percent) => self.percent = percent,
            TickOutcome::Failed(percent) => {
                self.percent = percent;
                self.status = UploadStatus::Failed;
                self.error = Some(UPLOAD_FAILED_MESSAGE.to_string());
            }
            TickOutcome::Completed => {
                self.percent = 100;
                self.status = UploadStatus::Succeeded;
            }
        }
    }
}
