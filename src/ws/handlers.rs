//! WebSocket message dispatch
//!
//! Authorization is checked here, then dispatched to role-specific handler modules.

use crate::engine::PenaltyRequest;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::{scorer, viewer};

/// Macro to check scorer authorization and return early if unauthorized
macro_rules! check_scorer {
    ($role:expr, $action:expr) => {
        if *$role != Role::Scorer {
            return Some(ServerMessage::error(
                "UNAUTHORIZED",
                format!("Only the scorer can {}", $action),
            ));
        }
    };
}

/// Handle client messages and return optional response.
///
/// `JoinLive` answers with a single snapshot here and follows nothing. The
/// socket loop handles `JoinLive` itself so it can keep the subscription.
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Viewer messages
        ClientMessage::JoinLive { game_code } => {
            let (reply, subscription) = viewer::join_live(state, &game_code).await;
            if let Some(subscription) = subscription {
                subscription.unsubscribe();
            }
            Some(reply)
        }

        // Scorer-only commands (authorization checked before dispatch)
        ClientMessage::StartGame(setup) => {
            check_scorer!(role, "start games");
            scorer::handle_start_game(state, setup).await
        }

        ClientMessage::ResumeGame { game_id } => {
            check_scorer!(role, "resume games");
            scorer::handle_resume_game(state, game_id).await
        }

        ClientMessage::GetState => {
            check_scorer!(role, "read the score sheet");
            scorer::handle_get_state(state).await
        }

        ClientMessage::IncrementBid { player_id } => {
            check_scorer!(role, "enter bids");
            scorer::respond(state, state.increment_bid(&player_id).await)
        }

        ClientMessage::DecrementBid { player_id } => {
            check_scorer!(role, "enter bids");
            scorer::respond(state, state.decrement_bid(&player_id).await)
        }

        ClientMessage::SetBid { player_id, bid } => {
            check_scorer!(role, "enter bids");
            scorer::respond(state, state.set_bid(&player_id, bid).await)
        }

        ClientMessage::IncrementTricks { player_id } => {
            check_scorer!(role, "enter tricks");
            scorer::respond(state, state.increment_tricks(&player_id).await)
        }

        ClientMessage::DecrementTricks { player_id } => {
            check_scorer!(role, "enter tricks");
            scorer::respond(state, state.decrement_tricks(&player_id).await)
        }

        ClientMessage::SetTricks { player_id, tricks } => {
            check_scorer!(role, "enter tricks");
            scorer::respond(state, state.set_tricks(&player_id, tricks).await)
        }

        ClientMessage::CorrectBid {
            player_id,
            direction,
        } => {
            check_scorer!(role, "correct bids");
            scorer::respond(state, state.correct_bid(&player_id, direction).await)
        }

        ClientMessage::SetVoidedTrick { voided } => {
            check_scorer!(role, "void tricks");
            scorer::respond(state, state.set_voided_trick(voided).await)
        }

        ClientMessage::CompleteBidding => {
            check_scorer!(role, "complete bidding");
            scorer::respond(state, state.complete_bidding().await)
        }

        ClientMessage::CompleteRound => {
            check_scorer!(role, "complete rounds");
            scorer::handle_complete_round(state).await
        }

        ClientMessage::AddPenalty {
            player_id,
            kind,
            description,
            points,
        } => {
            check_scorer!(role, "record penalties");
            let request = PenaltyRequest {
                kind,
                description,
                points,
            };
            scorer::respond(state, state.add_penalty(&player_id, request).await)
        }

        ClientMessage::ResetPenaltyMultiplier { player_id } => {
            check_scorer!(role, "reset penalty multipliers");
            scorer::respond(state, state.reset_penalty_multiplier(&player_id).await)
        }

        ClientMessage::AbandonGame => {
            check_scorer!(role, "abandon games");
            scorer::handle_abandon_game(state).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameSetup;
    use crate::store::{LiveStore, MemoryStore};
    use crate::types::GameRules;

    #[tokio::test]
    async fn test_viewer_cannot_score() {
        let state = Arc::new(AppState::in_memory());
        let reply = handle_message(ClientMessage::CompleteBidding, &Role::Viewer, &state).await;
        match reply {
            Some(ServerMessage::Error { code, msg }) => {
                assert_eq!(code, "UNAUTHORIZED");
                assert!(msg.contains("complete bidding"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_intent_without_game() {
        let state = Arc::new(AppState::in_memory());
        let reply = handle_message(
            ClientMessage::IncrementBid {
                player_id: "p".to_string(),
            },
            &Role::Scorer,
            &state,
        )
        .await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Error { ref code, .. }) if code == "NO_ACTIVE_GAME"
        ));
    }

    #[tokio::test]
    async fn test_join_live_is_a_single_snapshot() {
        let live = Arc::new(LiveStore::new(Arc::new(MemoryStore::new())));
        let state = Arc::new(AppState::new(live.clone()));
        let game = state
            .start_game(GameSetup {
                player_names: vec!["Alice".into(), "Bob".into()],
                total_rounds: 3,
                rules: GameRules::default(),
            })
            .await
            .unwrap();
        let code = game.game_code.clone().unwrap();

        let reply = handle_message(
            ClientMessage::JoinLive { game_code: code },
            &Role::Viewer,
            &state,
        )
        .await;
        match reply {
            Some(ServerMessage::LiveSnapshot { view }) => assert_eq!(view.game.id, game.id),
            other => panic!("unexpected {:?}", other),
        }

        // no subscription is left behind for this game
        assert_eq!(live.subscriber_count(&game.id).await, 0);

        let reply = handle_message(
            ClientMessage::JoinLive {
                game_code: "ZZZZZZ".to_string(),
            },
            &Role::Viewer,
            &state,
        )
        .await;
        assert!(matches!(
            reply,
            Some(ServerMessage::LiveError { ref code, .. }) if code == "GAME_NOT_FOUND"
        ));
    }
}
