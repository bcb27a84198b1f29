//! Scorer command handlers
//!
//! All handlers in this module require the Scorer role.
//! Authorization is checked in the main dispatch layer before calling these.

use crate::engine::GameSetup;
use crate::protocol::ServerMessage;
use crate::state::{AppState, StateError};
use crate::types::{Game, GameId};
use std::sync::Arc;

pub fn error_message(e: &StateError) -> ServerMessage {
    ServerMessage::error(e.code(), e.to_string())
}

/// Reply to a mutation. The new state also goes to every other scorer.
pub fn respond(state: &Arc<AppState>, result: Result<Game, StateError>) -> Option<ServerMessage> {
    match result {
        Ok(game) => {
            let msg = ServerMessage::game_state(&game);
            state.broadcast_to_scorers(msg.clone());
            Some(msg)
        }
        Err(e) => {
            tracing::debug!("Scorer intent refused: {}", e);
            Some(error_message(&e))
        }
    }
}

pub async fn handle_start_game(state: &Arc<AppState>, setup: GameSetup) -> Option<ServerMessage> {
    match state.start_game(setup).await {
        Err(StateError::Setup(e)) => Some(ServerMessage::SetupRejected { errors: e.errors }),
        result => respond(state, result),
    }
}

pub async fn handle_resume_game(state: &Arc<AppState>, game_id: GameId) -> Option<ServerMessage> {
    tracing::info!("Scorer resuming game {}", game_id);
    respond(state, state.resume_game(&game_id).await)
}

pub async fn handle_get_state(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.get_game().await {
        Some(game) => Some(ServerMessage::game_state(&game)),
        None => Some(error_message(&StateError::NoActiveGame)),
    }
}

pub async fn handle_complete_round(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.complete_round().await {
        Ok(game) if game.is_complete => {
            let msg = ServerMessage::game_ended(&game);
            state.broadcast_to_scorers(msg.clone());
            Some(msg)
        }
        result => respond(state, result),
    }
}

pub async fn handle_abandon_game(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.abandon_game().await {
        Ok(game_id) => {
            let msg = ServerMessage::GameAbandoned { game_id };
            state.broadcast_to_scorers(msg.clone());
            Some(msg)
        }
        Err(e) => Some(error_message(&e)),
    }
}
