//! Embedded HTTP surface: session state, clip playback and triggers.

mod routes;

pub(crate) use routes::{ServerState, router};

use crate::{AppError, AppResult};

use std::panic::Location;

use axum::Router;
use error_location::ErrorLocation;
use tokio::{net::TcpListener, sync::watch};
use tracing::info;

/// Serves `app` on `listener` until `shutdown` turns true.
pub(crate) async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
) -> AppResult<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| AppError::ServerError {
            reason: format!("HTTP server stopped: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("HTTP server stopped");

    Ok(())
}
