use crate::store::VideoArtifact;

use std::{fmt, sync::Arc};

use serde::Serialize;

/// Named state of the recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Loading the stored artifact at startup.
    Initializing,
    /// Nothing stored, nothing recording.
    IdleNoArtifact,
    /// One stored artifact available for preview and upload.
    IdleHasArtifact,
    /// A device stream is held and chunks are being captured.
    Recording,
    /// The last user action failed; see `last_error`.
    Error,
}

impl Phase {
    /// Stable kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::IdleNoArtifact => "idle-no-artifact",
            Phase::IdleHasArtifact => "idle-has-artifact",
            Phase::Recording => "recording",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What observers see after each transition.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Currently loaded artifact. Kept through the error phase.
    pub artifact: Option<Arc<VideoArtifact>>,
    /// User-facing description of the last failure.
    pub last_error: Option<String>,
    /// Whether repeating the failed action unchanged can succeed.
    pub retryable: bool,
    /// Whether device access was verified outside of recording.
    pub permission_known: bool,
}

impl SessionSnapshot {
    pub(crate) fn initializing() -> Self {
        Self {
            phase: Phase::Initializing,
            artifact: None,
            last_error: None,
            retryable: false,
            permission_known: false,
        }
    }

    /// Id of the loaded artifact, if any.
    pub fn artifact_id(&self) -> Option<uuid::Uuid> {
        self.artifact.as_ref().map(|artifact| artifact.id)
    }
}
