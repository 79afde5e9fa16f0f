use crate::{AppCommand, AppResult};

use clip_recorder_core::{MediaDevices, Phase, SessionController, UploadSimulator, VideoStore};

use tokio::sync::{mpsc, watch};
use tracing::{info, instrument, warn};

/// Main application state.
///
/// Owns the session controller and the upload simulator and applies
/// commands one at a time, so a trigger never starts while another is
/// still suspended.
pub struct App<S: VideoStore, D: MediaDevices> {
    pub(crate) controller: SessionController<S, D>,
    pub(crate) upload: UploadSimulator,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl<S: VideoStore, D: MediaDevices> App<S, D> {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Clip-Recorder starting");

        self.controller.initialize().await;

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if !self.handle(cmd).await {
                        info!("Shutdown requested");
                        break;
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.upload.reset();

        if self.controller.capture().is_active() {
            info!("Finishing active recording before exit");
            self.controller.stop_recording().await;
        }

        let _ = self.shutdown_tx.send(true);
        info!("Clip-Recorder shut down successfully");

        Ok(())
    }

    /// Applies one command. Returns `false` once shutdown is requested.
    #[instrument(skip(self))]
    pub(crate) async fn handle(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::StartRecording { request_id } => {
                self.upload.reset();
                let state = self.controller.start_recording().await;
                info!(request_id = %request_id, phase = %state.phase, "Start handled");
            }
            AppCommand::StopRecording { request_id } => {
                self.upload.reset();
                let state = self.controller.stop_recording().await;
                info!(request_id = %request_id, phase = %state.phase, "Stop handled");
            }
            AppCommand::DeleteClip { request_id } => {
                self.upload.reset();
                let state = self.controller.delete_artifact().await;
                info!(request_id = %request_id, phase = %state.phase, "Delete handled");
            }
            AppCommand::RequestPermission { request_id } => {
                let state = self.controller.request_permission().await;
                info!(
                    request_id = %request_id,
                    permission_known = state.permission_known,
                    "Permission request handled"
                );
            }
            AppCommand::StartUpload { request_id } => {
                if self.controller.artifact().is_none()
                    || self.controller.phase() == Phase::Recording
                {
                    warn!(
                        request_id = %request_id,
                        phase = %self.controller.phase(),
                        "Upload ignored: no stored clip to upload"
                    );
                } else {
                    self.upload.start();
                    info!(request_id = %request_id, "Upload started");
                }
            }
            AppCommand::ResetUpload { request_id } => {
                self.upload.reset();
                info!(request_id = %request_id, "Upload reset");
            }
            AppCommand::Shutdown => return false,
        }

        true
    }
}
