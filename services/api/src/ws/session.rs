//! Manages the WebSocket connection lifecycle for a companion session.

use super::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use anyhow::{Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use sprout_core::{
    bridge::{BridgeUpdate, PlaySession},
    conversation::ConversationOrchestrator,
    request::{AccommodationTag, LearnerProfile},
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// The first message from the client must be `init` with the learner's
/// details. On success the companion opens the conversation and sends its
/// greeting; from then on the loop relays chat turns and sandbox events.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    tracing::Span::current().record("session_id", session_id.to_string());
    info!("New WebSocket connection. Awaiting initialization...");

    let (mut socket_tx, mut socket_rx) = socket.split();

    let profile = if let Some(Ok(ws_msg)) = socket_rx.next().await {
        match ws_msg {
            Message::Text(text) => parse_init(&text),
            _ => Err(anyhow!("First message was not a text `init` message.")),
        }
    } else {
        info!("Client disconnected before sending init message.");
        return;
    };

    let profile = match profile {
        Ok(profile) => profile,
        Err(e) => {
            error!("Session initialization failed: {:?}", e);
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };

    info!(age = profile.age, "Session initialized");
    let mut conversation = ConversationOrchestrator::open(state.reasoning.clone(), &profile).await;

    if send_msg(
        &mut socket_tx,
        ServerMessage::Initialized {
            greeting: conversation.last_reply().to_string(),
        },
    )
    .await
    .is_err()
    {
        error!("Failed to send Initialized message to client.");
        return;
    }

    if let Err(e) = run_session(&mut socket_tx, &mut socket_rx, &mut conversation).await {
        error!(error = ?e, "Companion session terminated with error.");
    }
    info!("Companion session finished.");
}

/// Parses the `init` message into a validated learner profile.
fn parse_init(init_text: &str) -> Result<LearnerProfile> {
    let init_msg: ClientMessage = serde_json::from_str(init_text)?;
    let ClientMessage::Init {
        name,
        age,
        disability,
    } = init_msg
    else {
        return Err(anyhow!("First message must be `init`"));
    };

    if !(1..=18).contains(&age) {
        return Err(anyhow!("age must be between 1 and 18, got {}", age));
    }
    Ok(LearnerProfile {
        name,
        age: age as u8,
        accommodation: AccommodationTag::parse(&disability),
    })
}

/// The main event loop for an active WebSocket session.
///
/// Chat turns go through the conversation orchestrator; sandbox events go
/// through the play session bridge. A `play_start` replaces any previous
/// play session so achievements dedupe per run, not per connection.
async fn run_session(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    socket_rx: &mut SplitStream<WebSocket>,
    conversation: &mut ConversationOrchestrator,
) -> Result<()> {
    let mut play: Option<PlaySession> = None;

    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(ws_msg) => match ws_msg {
                Message::Text(text) => {
                    let Ok(msg) = serde_json::from_str::<ClientMessage>(&text) else {
                        warn!("Ignoring unparseable client message.");
                        continue;
                    };
                    match msg {
                        ClientMessage::UserMessage { text } => {
                            let reply = conversation.say(&text).await.to_string();
                            send_msg(socket_tx, ServerMessage::AssistantReply { text: reply })
                                .await?;
                        }
                        ClientMessage::PlayStart => {
                            info!("Play session started");
                            play = Some(PlaySession::new());
                        }
                        ClientMessage::SandboxEvent { message } => {
                            let Some(session) = play.as_mut() else {
                                warn!("Sandbox event received outside a play session.");
                                continue;
                            };
                            let raw = message.to_string();
                            if let Some(update) = session.handle_raw(&raw) {
                                send_msg(socket_tx, bridge_update_to_msg(update)).await?;
                            }
                        }
                        ClientMessage::Init { .. } => {
                            warn!("Ignoring duplicate init message post-handshake.");
                        }
                    }
                }
                Message::Close(_) => {
                    info!("Client sent close frame. Shutting down session.");
                    break;
                }
                Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
            },
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}

fn bridge_update_to_msg(update: BridgeUpdate) -> ServerMessage {
    match update {
        BridgeUpdate::AchievementUnlocked { title } => ServerMessage::AchievementUnlocked { title },
        BridgeUpdate::ScoreChanged { score } => ServerMessage::ScoreUpdated { score },
        BridgeUpdate::Ended { final_score } => ServerMessage::GameEnded { final_score },
    }
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
