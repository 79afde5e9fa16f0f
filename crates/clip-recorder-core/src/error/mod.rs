use crate::capture::DeviceFailure;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Message shown when a finished recording could not be persisted.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save video locally.";

/// Recorder errors with source location tracking.
///
/// Device variants mirror the reason codes a capture host reports; storage
/// variants mirror the persistent store operations.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// The user or the system refused device access.
    #[error("Device access denied {location}")]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No camera or microphone is present.
    #[error("No capture device found {location}")]
    DeviceNotFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The device is held by another consumer.
    #[error("Capture device busy {location}")]
    DeviceBusy {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The host cannot satisfy the requested capture parameters.
    #[error("Capture constraints unsatisfiable {location}")]
    ConstraintsUnsatisfiable {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The host lacks the requested capture capability.
    #[error("Capture capability unsupported {location}")]
    CapabilityUnsupported {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Access blocked by transport security requirements.
    #[error("Device access blocked by insecure context {location}")]
    InsecureContext {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The host has no recording capability at all.
    #[error("Recording unsupported in this environment {location}")]
    UnsupportedEnvironment {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Device access failed for a reason outside the known taxonomy.
    #[error("Device access failed: {reason} {location}")]
    DeviceAccessFailed {
        /// Host-reported reason.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A capture session is already acquiring, active, or finalizing.
    #[error("Capture session busy {location}")]
    CaptureBusy {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording pipeline did not confirm finalization.
    #[error("Recording finalization failed: {reason} {location}")]
    FinalizeFailed {
        /// Description of the finalization failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No persistent storage is available.
    #[error("Storage unavailable: {reason} {location}")]
    StorageUnavailable {
        /// Description of the storage failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Writing an artifact was rejected.
    #[error("Storage write failed: {reason} {location}")]
    WriteFailed {
        /// Description of the write failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Reading artifacts failed.
    #[error("Storage read failed: {reason} {location}")]
    ReadFailed {
        /// Description of the read failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Deleting an artifact failed.
    #[error("Storage delete failed: {reason} {location}")]
    DeleteFailed {
        /// Description of the delete failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl RecorderError {
    /// Maps a host-reported device failure onto the error taxonomy.
    #[track_caller]
    pub fn from_device_failure(failure: DeviceFailure) -> Self {
        let location = ErrorLocation::from(Location::caller());

        match failure {
            DeviceFailure::PermissionDenied => RecorderError::PermissionDenied { location },
            DeviceFailure::DeviceNotFound => RecorderError::DeviceNotFound { location },
            DeviceFailure::DeviceBusy => RecorderError::DeviceBusy { location },
            DeviceFailure::ConstraintsUnsatisfiable => {
                RecorderError::ConstraintsUnsatisfiable { location }
            }
            DeviceFailure::CapabilityUnsupported => RecorderError::CapabilityUnsupported { location },
            DeviceFailure::InsecureContext => RecorderError::InsecureContext { location },
            DeviceFailure::Other(reason) => RecorderError::DeviceAccessFailed { reason, location },
        }
    }

    /// Text shown to the user in the error phase, with guidance where the
    /// user can act on it.
    pub fn user_message(&self) -> &'static str {
        match self {
            RecorderError::PermissionDenied { .. } => {
                "Please allow camera and microphone access when asked. If you dismissed the prompt, grant access in your system privacy settings and try again."
            }
            RecorderError::DeviceNotFound { .. } => "No camera or microphone found on your device.",
            RecorderError::DeviceBusy { .. } => {
                "Camera/microphone is already in use by another application. Please close other apps using your camera/microphone and try again."
            }
            RecorderError::ConstraintsUnsatisfiable { .. } => {
                "Camera/microphone constraints could not be satisfied."
            }
            RecorderError::CapabilityUnsupported { .. }
            | RecorderError::UnsupportedEnvironment { .. } => {
                "This environment does not support video recording."
            }
            RecorderError::InsecureContext { .. } => {
                "Camera/microphone access blocked. Make sure the recorder is reached over a secure connection and try again."
            }
            RecorderError::DeviceAccessFailed { .. } => "Could not access camera/microphone.",
            RecorderError::CaptureBusy { .. } => "A recording is already in progress.",
            RecorderError::FinalizeFailed { .. } => "The recording could not be finalized.",
            RecorderError::StorageUnavailable { .. } => "Local storage is not available.",
            RecorderError::WriteFailed { .. } => SAVE_FAILED_MESSAGE,
            RecorderError::ReadFailed { .. } => "Failed to load the saved video.",
            RecorderError::DeleteFailed { .. } => "Failed to delete the saved video.",
        }
    }

    /// Whether re-issuing the same action without changing anything can
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecorderError::PermissionDenied { .. }
                | RecorderError::DeviceBusy { .. }
                | RecorderError::InsecureContext { .. }
                | RecorderError::DeviceAccessFailed { .. }
                | RecorderError::CaptureBusy { .. }
                | RecorderError::FinalizeFailed { .. }
                | RecorderError::WriteFailed { .. }
                | RecorderError::ReadFailed { .. }
                | RecorderError::DeleteFailed { .. }
        )
    }

    /// Whether the error came from the capture side rather than storage.
    pub fn is_device_error(&self) -> bool {
        !matches!(
            self,
            RecorderError::StorageUnavailable { .. }
                | RecorderError::WriteFailed { .. }
                | RecorderError::ReadFailed { .. }
                | RecorderError::DeleteFailed { .. }
        )
    }
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = std::result::Result<T, RecorderError>;
