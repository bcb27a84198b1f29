use crate::protocol::{GameView, ServerMessage};
use crate::state::AppState;
use crate::store::Subscription;
use std::sync::Arc;

/// Look up a game by code. On success the reply is the first snapshot and
/// the subscription delivers the rest.
pub async fn join_live(
    state: &Arc<AppState>,
    code: &str,
) -> (ServerMessage, Option<Subscription>) {
    match state.join_live(code).await {
        Ok((game, subscription)) => (
            ServerMessage::LiveSnapshot {
                view: GameView::new(&game),
            },
            Some(subscription),
        ),
        Err(e) => {
            tracing::warn!("Viewer could not join {}: {}", code, e);
            (
                ServerMessage::LiveError {
                    code: e.code().to_string(),
                    msg: e.to_string(),
                },
                None,
            )
        }
    }
}
