//! Clip-Recorder: record one clip at a time, keep it locally, and simulate
//! uploading it, driven from a local web UI.

mod app;
mod app_command;
mod config;
mod error;
mod host;
mod logging;
mod server;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
};

use crate::{
    config::{Config, LoggingConfig},
    host::{CpalDevices, WAV_MIME_TYPE},
    server::ServerState,
};

use clip_recorder_core::{CaptureSession, FsVideoStore, SessionController, UploadSimulator};

use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
};
use tracing::{error, info, instrument, warn};

/// Application entry point.
fn main() {
    let config = Config::load();

    let logging = match &config {
        Ok(config) => config.logging.clone(),
        Err(_) => LoggingConfig::default(),
    };

    // Held until exit so buffered file logs are flushed.
    let _log_guard = match logging::init(&logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Config validation failed: {:?}", e);
        std::process::exit(1);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run(config)) {
        error!(error = ?e, "App error");
        std::process::exit(1);
    }
}

#[instrument(skip(config))]
async fn run(config: Config) -> AppResult<()> {
    let store = open_store(config.clip_dir()?).await;

    let capture = CaptureSession::new(CpalDevices::new(), config.capture.constraints())
        .with_finalize_timeout(config.capture.finalize_timeout());
    let controller = SessionController::new(store, capture);
    let upload = UploadSimulator::new(config.upload.settings());

    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = ServerState {
        commands: command_tx.clone(),
        session: controller.subscribe(),
        upload: upload.subscribe(),
        clip_mime: WAV_MIME_TYPE,
    };
    let router = server::router(state, config.server.static_dir.as_deref());

    let listener = TcpListener::bind(("127.0.0.1", config.server.port)).await?;
    let server_handle = tokio::spawn(server::serve(listener, router, shutdown_rx));

    if config.server.open_browser {
        let url = config.server_url();
        match open::that(&url) {
            Ok(()) => info!(url = %url, "Opened UI"),
            Err(e) => warn!(url = %url, error = ?e, "Failed to open UI"),
        }
    }

    let ctrl_c_tx = command_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                if let Err(e) = ctrl_c_tx.send(AppCommand::Shutdown).await {
                    error!(error = ?e, "Failed to send shutdown command");
                }
            }
            Err(e) => error!(error = ?e, "Failed to listen for interrupt"),
        }
    });
    drop(command_tx);

    let app = App {
        controller,
        upload,
        command_rx,
        shutdown_tx,
    };
    app.run().await?;

    match server_handle.await {
        Ok(result) => result,
        Err(e) => Err(AppError::ServerError {
            reason: format!("HTTP server task failed: {}", e),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

/// Opens the clip store. An unusable directory is logged and retried by
/// the store on each save, so the UI still comes up.
async fn open_store(dir: PathBuf) -> FsVideoStore {
    match FsVideoStore::open(&dir).await {
        Ok(store) => store,
        Err(e) => {
            error!(
                dir = %dir.display(),
                error = ?e,
                "Clip store unavailable, starting without a stored clip"
            );
            FsVideoStore::new(dir)
        }
    }
}
