use super::AppState;
use crate::session::{SessionStore, TranscriptEntry};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Replay the current transcript.
    History,
    Ping,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Connected { session: String },
    History { entries: Vec<TranscriptEntry> },
    Error { message: String },
    Pong,
}

impl ServerMessage {
    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","message":"serialization failed"}"#.to_owned())
    }
}

/// GET /websocket — upgrade handshake. A request without a valid upgrade
/// header is answered 426 and binds nothing.
pub(super) async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    match ws {
        Ok(upgrade) => {
            let store = state.registry.resolve(&state.session_name).await;
            upgrade
                .on_upgrade(move |socket| handle_socket(socket, store))
                .into_response()
        }
        Err(rejection) => {
            tracing::debug!("websocket handshake rejected: {rejection}");
            (StatusCode::UPGRADE_REQUIRED, "Expected WebSocket upgrade").into_response()
        }
    }
}

/// The open connection, bound 1:1 to its session's store. Inbound messages
/// never trigger the moderation protocol — that binding belongs to the
/// surrounding application.
async fn handle_socket(mut socket: WebSocket, store: Arc<SessionStore>) {
    let connection_id = Uuid::new_v4();
    tracing::debug!(connection = %connection_id, session = %store.id(), "websocket open");

    let connected = ServerMessage::Connected {
        session: store.id().to_string(),
    };
    if send_message(&mut socket, &connected).await.is_err() {
        return;
    }

    while let Some(result) = socket.recv().await {
        let message = match result {
            Ok(message) => message,
            Err(error) => {
                tracing::debug!(connection = %connection_id, "websocket receive error: {error}");
                break;
            }
        };

        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_message) => {
                    if handle_client_message(&mut socket, &store, client_message)
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(error) => {
                    let reply = ServerMessage::Error {
                        message: format!("invalid message: {error}"),
                    };
                    if send_message(&mut socket, &reply).await.is_err() {
                        break;
                    }
                }
            },
            Message::Close(frame) => {
                match frame {
                    Some(frame) => tracing::debug!(
                        connection = %connection_id,
                        "websocket closed: {} {}",
                        frame.code,
                        frame.reason.as_str()
                    ),
                    None => tracing::debug!(connection = %connection_id, "websocket closed"),
                }
                break;
            }
            Message::Ping(data) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            _ => {}
        }
    }
}

async fn handle_client_message(
    socket: &mut WebSocket,
    store: &SessionStore,
    message: ClientMessage,
) -> Result<(), axum::Error> {
    match message {
        ClientMessage::History => {
            let reply = match store.snapshot().await {
                Ok(entries) => ServerMessage::History { entries },
                Err(error) => ServerMessage::Error {
                    message: error.to_string(),
                },
            };
            send_message(socket, &reply).await?;
        }
        ClientMessage::Ping => {
            send_message(socket, &ServerMessage::Pong).await?;
        }
    }

    Ok(())
}

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = message.to_json();
    socket.send(Message::Text(json.into())).await
}
