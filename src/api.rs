//! HTTP API endpoints for stored games.
//!
//! Used by the setup and history screens and by viewers without a socket.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::{score_progression, standings, GameSetup, PlayerProgression, Standing};
use crate::protocol::{GameView, ServerMessage};
use crate::state::{AppState, GameSummary, StateError, ViewerError};
use crate::types::Game;

/// Error body shared by every endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl IntoResponse for StateError {
    fn into_response(self) -> Response {
        let status = match &self {
            StateError::Setup(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StateError::InvalidDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StateError::NotFound(_) => StatusCode::NOT_FOUND,
            StateError::NoActiveGame => StatusCode::CONFLICT,
            StateError::GameInProgress(_) => StatusCode::CONFLICT,
            StateError::Engine(_) => StatusCode::CONFLICT,
            StateError::Store(e) => {
                tracing::error!("Store error while serving request: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let errors = match &self {
            StateError::Setup(e) => e.errors.clone(),
            _ => Vec::new(),
        };
        let body = ApiError {
            code: self.code().to_string(),
            message: self.to_string(),
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ViewerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ViewerError::LiveUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ViewerError::GameNotFound(_) => StatusCode::NOT_FOUND,
            ViewerError::Connection(_) => StatusCode::BAD_GATEWAY,
        };
        let body = ApiError {
            code: self.code().to_string(),
            message: self.to_string(),
            errors: Vec::new(),
        };
        (status, Json(body)).into_response()
    }
}

/// Routes under `/api`
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/games", get(list_games).post(create_game))
        .route("/api/games/import", post(import_game))
        .route("/api/games/{id}", get(get_game).delete(delete_game))
        .route("/api/games/{id}/standings", get(game_standings))
        .route("/api/live/{code}", get(live_snapshot))
}

/// List stored games, newest first.
///
/// GET /api/games
pub async fn list_games(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GameSummary>>, StateError> {
    Ok(Json(state.list_games().await?))
}

/// Set up a new game and start scoring it.
///
/// POST /api/games
///
/// 201 with the new game, or 422 with every setup problem.
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(setup): Json<GameSetup>,
) -> Result<(StatusCode, Json<GameView>), StateError> {
    let game = state.start_game(setup).await?;
    state.broadcast_to_scorers(ServerMessage::game_state(&game));
    Ok((StatusCode::CREATED, Json(GameView::new(&game))))
}

/// Store a game document after validating it.
///
/// POST /api/games/import
pub async fn import_game(
    State(state): State<Arc<AppState>>,
    Json(game): Json<Game>,
) -> Result<(StatusCode, Json<Game>), StateError> {
    let game = state.import_game(game).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// GET /api/games/{id}
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Game>, StateError> {
    Ok(Json(state.stored_game(&id).await?))
}

/// DELETE /api/games/{id}
pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, StateError> {
    // NotFound for unknown ids
    state.stored_game(&id).await?;
    state.delete_game(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingsResponse {
    pub standings: Vec<Standing>,
    pub progression: Vec<PlayerProgression>,
}

/// Leaderboard and per-round running totals.
///
/// GET /api/games/{id}/standings
pub async fn game_standings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StandingsResponse>, StateError> {
    let game = state.stored_game(&id).await?;
    Ok(Json(StandingsResponse {
        standings: standings(&game),
        progression: score_progression(&game),
    }))
}

/// One-shot view of a live game.
///
/// GET /api/live/{code}
pub async fn live_snapshot(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<GameView>, ViewerError> {
    let (game, _subscription) = state.join_live(&code).await?;
    Ok(Json(GameView::new(&game)))
}
