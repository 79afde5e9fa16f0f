use crate::AppCommand;

use clip_recorder_core::{Phase, SessionSnapshot, UploadProgress};

use std::path::Path;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{debug, warn};
use uuid::Uuid;

/// Shared handles the route handlers read from and send to.
#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) commands: mpsc::Sender<AppCommand>,
    pub(crate) session: watch::Receiver<SessionSnapshot>,
    pub(crate) upload: watch::Receiver<UploadProgress>,
    pub(crate) clip_mime: &'static str,
}

#[derive(Debug, Serialize)]
struct ArtifactSummary {
    id: Uuid,
    created_at: u64,
    size_bytes: usize,
}

#[derive(Debug, Serialize)]
struct StateResponse {
    phase: Phase,
    artifact: Option<ArtifactSummary>,
    last_error: Option<String>,
    retryable: bool,
    permission_known: bool,
    upload: UploadProgress,
}

#[derive(Debug, Serialize)]
struct Accepted {
    request_id: Uuid,
}

/// Builds the API router, serving `static_dir` for every other path.
pub(crate) fn router(state: ServerState, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/state", get(get_state))
        .route("/api/clip", get(get_clip).delete(delete_clip))
        .route("/api/recording/start", post(start_recording))
        .route("/api/recording/stop", post(stop_recording))
        .route("/api/permission", post(request_permission))
        .route("/api/upload", post(start_upload))
        .route("/api/upload/reset", post(reset_upload))
        .with_state(state);

    let api = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    api.layer(CorsLayer::permissive())
}

async fn get_state(State(state): State<ServerState>) -> Json<StateResponse> {
    let session = state.session.borrow().clone();
    let upload = state.upload.borrow().clone();

    Json(StateResponse {
        phase: session.phase,
        artifact: session.artifact.as_ref().map(|artifact| ArtifactSummary {
            id: artifact.id,
            created_at: artifact.created_at,
            size_bytes: artifact.size_bytes(),
        }),
        last_error: session.last_error,
        retryable: session.retryable,
        permission_known: session.permission_known,
        upload,
    })
}

async fn get_clip(State(state): State<ServerState>) -> Response {
    let artifact = state.session.borrow().artifact.clone();

    match artifact {
        Some(artifact) => {
            debug!(id = %artifact.id, size_bytes = artifact.size_bytes(), "Serving clip");
            (
                [(header::CONTENT_TYPE, state.clip_mime)],
                artifact.payload.clone(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_recording(State(state): State<ServerState>) -> Response {
    enqueue(&state, |request_id| AppCommand::StartRecording { request_id }).await
}

async fn stop_recording(State(state): State<ServerState>) -> Response {
    enqueue(&state, |request_id| AppCommand::StopRecording { request_id }).await
}

async fn delete_clip(State(state): State<ServerState>) -> Response {
    enqueue(&state, |request_id| AppCommand::DeleteClip { request_id }).await
}

async fn request_permission(State(state): State<ServerState>) -> Response {
    enqueue(&state, |request_id| AppCommand::RequestPermission { request_id }).await
}

async fn start_upload(State(state): State<ServerState>) -> Response {
    enqueue(&state, |request_id| AppCommand::StartUpload { request_id }).await
}

async fn reset_upload(State(state): State<ServerState>) -> Response {
    enqueue(&state, |request_id| AppCommand::ResetUpload { request_id }).await
}

async fn enqueue(state: &ServerState, command: impl FnOnce(Uuid) -> AppCommand) -> Response {
    let request_id = Uuid::new_v4();

    match state.commands.send(command(request_id)).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(Accepted { request_id })).into_response(),
        Err(e) => {
            warn!(request_id = %request_id, command = ?e.0, "Command loop is gone");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
