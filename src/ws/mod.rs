pub mod handlers;
mod scorer;
mod viewer;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::protocol::{ClientMessage, GameView, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::store::Subscription;
use crate::types::{Game, Role};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
    /// Join code a viewer wants to follow right away
    pub code: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: role={:?}, code={:?}",
        params.role,
        params.code
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Serialize and send one message; false once the client is gone
async fn send_message(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let role = match params.role.as_deref() {
        Some("scorer") => Role::Scorer,
        _ => Role::Viewer,
    };

    tracing::info!("WebSocket connected with role: {:?}", role);

    let game = match role {
        Role::Scorer => state.get_game().await.map(|g| GameView::new(&g)),
        Role::Viewer => None,
    };

    // Send welcome message
    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        role,
        live_enabled: state.live_enabled(),
        game,
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_message(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    // Subscribe to scorer broadcasts if Scorer
    let mut scorer_rx = match role {
        Role::Scorer => Some(state.scorer_broadcast.subscribe()),
        Role::Viewer => None,
    };

    // Live game followed by this connection
    let mut live: Option<Subscription> = None;

    if let Some(code) = params.code.filter(|_| role == Role::Viewer) {
        let (reply, subscription) = viewer::join_live(&state, &code).await;
        live = subscription;
        if !send_message(&mut sender, &reply).await {
            return;
        }
    }

    loop {
        tokio::select! {
            // Handle scorer broadcasts
            scorer_msg = async {
                match &mut scorer_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // Viewer: wait forever
                        std::future::pending::<Option<ServerMessage>>().await
                    }
                }
            } => {
                if let Some(msg) = scorer_msg {
                    if !send_message(&mut sender, &msg).await {
                        break;
                    }
                }
            }

            // Handle snapshots of the followed game
            update = async {
                match &mut live {
                    Some(subscription) => subscription.recv().await,
                    None => std::future::pending::<Option<Game>>().await,
                }
            } => {
                let msg = match update {
                    Some(game) => ServerMessage::LiveSnapshot {
                        view: GameView::new(&game),
                    },
                    None => {
                        // channel closed: the game was deleted
                        live = None;
                        ServerMessage::LiveError {
                            code: "GAME_NOT_FOUND".to_string(),
                            msg: "The game is no longer available".to_string(),
                        }
                    }
                };
                if !send_message(&mut sender, &msg).await {
                    break;
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            // the subscription has to live in this loop
                            Ok(ClientMessage::JoinLive { game_code }) => {
                                let (reply, subscription) =
                                    viewer::join_live(&state, &game_code).await;
                                if subscription.is_some() {
                                    live = subscription;
                                }
                                Some(reply)
                            }
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &role, &state).await
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                Some(ServerMessage::error(
                                    "PARSE_ERROR",
                                    format!("Invalid message format: {}", e),
                                ))
                            }
                        };

                        if let Some(response) = response {
                            if !send_message(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}
