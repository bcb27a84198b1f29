mod game;
mod history;
mod live;
mod penalty;
mod round;

pub use history::GameSummary;

use crate::engine::{EngineError, GateBlock, SetupError};
use crate::persist::{spawn_persistence_worker, PersistHandle};
use crate::protocol::ServerMessage;
use crate::store::{GameStore, MemoryStore, StoreError};
use crate::types::*;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The game being scored, if any
    pub game: Arc<RwLock<Option<Game>>>,
    pub store: Arc<dyn GameStore>,
    pub persistence: PersistHandle,
    /// Broadcast channel for sending messages to every scorer client
    pub scorer_broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    /// Must be called inside a Tokio runtime; spawns the persistence worker.
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            game: Arc::new(RwLock::new(None)),
            persistence: spawn_persistence_worker(store.clone()),
            store,
            scorer_broadcast: tx,
        }
    }

    /// State backed by a throwaway in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Whether new games get a join code for live viewers
    pub fn live_enabled(&self) -> bool {
        self.store.supports_live()
    }

    pub fn broadcast_to_scorers(&self, msg: ServerMessage) {
        // no scorer connected is fine
        let _ = self.scorer_broadcast.send(msg);
    }
}

/// Errors from scorer operations on the shared state
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("no game is being scored")]
    NoActiveGame,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("game {0} not found")]
    NotFound(GameId),

    #[error("invalid game document: {0}")]
    InvalidDocument(String),

    #[error("game {0} is being scored")]
    GameInProgress(GameId),
}

impl StateError {
    /// Stable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            StateError::NoActiveGame => "NO_ACTIVE_GAME",
            StateError::Engine(e) => match e {
                EngineError::Blocked(_) => "GATE_BLOCKED",
                EngineError::UnknownPlayer(_) => "UNKNOWN_PLAYER",
                EngineError::WrongPhase { .. } => "WRONG_PHASE",
                EngineError::OutOfRange { .. } => "OUT_OF_RANGE",
                EngineError::EditionOnly(_) => "EDITION_ONLY",
                EngineError::BidCorrectionUsed => "BID_CORRECTION_USED",
                EngineError::GameComplete => "GAME_COMPLETE",
                EngineError::ScoreOverflow(_) => "SCORE_OVERFLOW",
            },
            StateError::Setup(_) => "SETUP_REJECTED",
            StateError::Store(_) => "STORE_ERROR",
            StateError::NotFound(_) => "GAME_NOT_FOUND",
            StateError::InvalidDocument(_) => "INVALID_DOCUMENT",
            StateError::GameInProgress(_) => "GAME_IN_PROGRESS",
        }
    }

    /// The gate that refused, if this is a blocked transition
    pub fn gate_block(&self) -> Option<&GateBlock> {
        match self {
            StateError::Engine(EngineError::Blocked(block)) => Some(block),
            _ => None,
        }
    }
}

/// Why a viewer could not follow a game
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Live sync requires a live-capable store. Please check your setup.")]
    LiveUnavailable,

    #[error("Game not found. Please check the game code \"{0}\".")]
    GameNotFound(String),

    #[error("Failed to connect to game: {0}")]
    Connection(#[from] StoreError),
}

impl ViewerError {
    pub fn code(&self) -> &'static str {
        match self {
            ViewerError::LiveUnavailable => "LIVE_UNAVAILABLE",
            ViewerError::GameNotFound(_) => "GAME_NOT_FOUND",
            ViewerError::Connection(_) => "CONNECTION_FAILED",
        }
    }
}
