use uuid::Uuid;

/// Commands sent from the HTTP surface to the main application loop.
///
/// Each trigger carries the id of the request that queued it so its log
/// lines can be correlated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Begin a recording.
    StartRecording {
        /// Id of the originating request.
        request_id: Uuid,
    },
    /// Finish the recording and store it.
    StopRecording {
        /// Id of the originating request.
        request_id: Uuid,
    },
    /// Delete the stored clip.
    DeleteClip {
        /// Id of the originating request.
        request_id: Uuid,
    },
    /// Check device access without recording.
    RequestPermission {
        /// Id of the originating request.
        request_id: Uuid,
    },
    /// Start a simulated upload of the stored clip.
    StartUpload {
        /// Id of the originating request.
        request_id: Uuid,
    },
    /// Cancel and clear the simulated upload.
    ResetUpload {
        /// Id of the originating request.
        request_id: Uuid,
    },
    /// Request application shutdown.
    Shutdown,
}
