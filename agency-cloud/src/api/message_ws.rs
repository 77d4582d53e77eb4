//! Realtime message WebSocket
//!
//! GET /api/messages/ws?token=<JWT>
//! The JWT travels in the query string because browsers cannot set headers on
//! WebSocket requests.
//!
//! Server → client: `MessageEvent` JSON frames (`ready`, `message_created`,
//! `conversation_read`, `resync`). Client frames other than close are ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::MessageEvent;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::user_auth;
use crate::live::ConnectionSlot;
use crate::error::ServiceError;
use crate::state::AppState;

/// Maximum concurrent message sockets per user
pub const MAX_SOCKETS_PER_USER: usize = 5;

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

/// GET /api/messages/ws?token=<JWT>
pub async fn handle_message_ws(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ServiceError> {
    let identity = user_auth::authenticate(&state, &query.token).await?;

    // The slot guard moves into the upgrade callback; it is released when the
    // session ends or when the upgrade never happens
    let slot = state
        .message_hub
        .try_connect(&identity.user_id, MAX_SOCKETS_PER_USER)
        .map_err(|current| {
            AppError::with_message(
                ErrorCode::ConnectionLimitExceeded,
                format!("Too many message connections ({current}/{MAX_SOCKETS_PER_USER})"),
            )
        })?;

    Ok(ws.on_upgrade(move |socket| message_ws_session(socket, state, slot)))
}

async fn message_ws_session(socket: WebSocket, state: AppState, slot: ConnectionSlot) {
    let user_id = slot.user_id().to_string();
    let (mut sink, mut stream) = socket.split();
    tracing::info!(user_id = %user_id, "Message WS connected");

    let mut hub_rx = state.message_hub.subscribe(&user_id);

    if send_event(&mut sink, &MessageEvent::Ready).await.is_ok() {
        let mut ping_interval = tokio::time::interval(PING_INTERVAL);
        ping_interval.tick().await; // skip immediate

        loop {
            tokio::select! {
                _ = ping_interval.tick() => {
                    if sink.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }

                event = hub_rx.recv() => {
                    match event {
                        Ok(event) => {
                            if send_event(&mut sink, &event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(user_id = %user_id, lagged = n, "Message subscriber lagged, requesting resync");
                            hub_rx = state.message_hub.subscribe(&user_id);
                            if send_event(&mut sink, &MessageEvent::Resync).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }

                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }

    // Receiver first, so the slot release can drop the idle channel
    drop(hub_rx);
    drop(slot);
    tracing::info!(user_id = %user_id, "Message WS disconnected");
}

async fn send_event<S>(sink: &mut S, event: &MessageEvent) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
