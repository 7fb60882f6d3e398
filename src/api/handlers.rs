//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ErrorResponse, JoinRequest, LeaveResponse, ParticipantRequest, RespondRequest, RespondResponse,
    StreamQuery, SuccessResponse, VoteRequest, WillRequest,
};
use super::AppState;
use crate::game::{AccessSnapshot, GameSnapshot, LobbyError};
use crate::runtime::CommandError;
use crate::state_machine::TransitionError;
use crate::voting::{VoteAck, VoteError};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Read-only views
        .route("/api/game", get(get_snapshot))
        .route("/api/game/access", get(get_access))
        // Lobby
        .route("/api/game/join", post(join))
        .route("/api/game/leave", post(leave))
        .route("/api/game/will", post(add_will_line))
        // Game lifecycle
        .route("/api/game/start", post(start))
        .route("/api/game/force-end", post(force_end))
        // Player input
        .route("/api/game/respond", post(respond))
        .route("/api/game/vote", post(vote))
        // SSE streaming
        .route("/api/game/stream", get(stream))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Views
// ============================================================

async fn get_snapshot(State(state): State<AppState>) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(state.game.snapshot().await?))
}

async fn get_access(State(state): State<AppState>) -> Result<Json<AccessSnapshot>, AppError> {
    Ok(Json(state.game.access().await?))
}

// ============================================================
// Lobby
// ============================================================

async fn join(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".to_string()));
    }
    state.game.join(req.id, name).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn leave(
    State(state): State<AppState>,
    Json(req): Json<ParticipantRequest>,
) -> Result<Json<LeaveResponse>, AppError> {
    let new_host = state.game.leave(req.id).await?;
    Ok(Json(LeaveResponse {
        success: true,
        new_host,
    }))
}

async fn add_will_line(
    State(state): State<AppState>,
    Json(req): Json<WillRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let line = req.line.trim();
    if line.is_empty() {
        return Err(AppError::BadRequest("Will line cannot be empty".to_string()));
    }
    state.game.add_will_line(req.id, line).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Lifecycle
// ============================================================

async fn start(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state.game.start().await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn force_end(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state.game.force_end().await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Player input
// ============================================================

/// Stale and malformed responses are ordinary outcomes, reported in the body
async fn respond(State(state): State<AppState>, Json(req): Json<RespondRequest>) -> Json<RespondResponse> {
    Json(RespondResponse {
        status: state.game.respond(&req.session_key, &req.value),
    })
}

async fn vote(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteAck>, AppError> {
    Ok(Json(state.game.submit_vote(req.voter, &req.choice).await?))
}

async fn stream(State(state): State<AppState>, Query(query): Query<StreamQuery>) -> impl IntoResponse {
    sse_stream(state.transport.subscribe(), query.participant)
}

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        let message = err.to_string();
        match err {
            CommandError::Lobby(LobbyError::NotJoined(_))
            | CommandError::Transition(TransitionError::Lobby(LobbyError::NotJoined(_))) => {
                AppError::NotFound(message)
            }
            CommandError::Vote(VoteError::Malformed(_)) => AppError::BadRequest(message),
            CommandError::Lobby(_) | CommandError::Vote(_) | CommandError::Transition(_) => {
                AppError::Conflict(message)
            }
            CommandError::EngineGone => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
