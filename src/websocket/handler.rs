//! WebSocket Handler
//!
//! Upgrades `/ws` requests and runs one dashboard connection. The caller
//! must be signed in; the connection then only sees and changes that
//! user's notifications.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};
use crate::api::{extract::SocketUser, AppState};
use crate::notifications::NotificationStore;

/// WebSocket upgrade handler
///
/// The user is resolved before the upgrade so a missing or stale token is
/// answered with 401 instead of an open socket.
pub async fn websocket_handler(
    SocketUser(user): SocketUser,
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Response {
    let hub = state.hub.clone();
    let notifications = Arc::clone(&state.notifications);
    let user_id = user.id().to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, notifications, user_id))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            None
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    hub: ConnectionHub,
    notifications: Arc<NotificationStore>,
    user_id: String,
) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection_id = match hub.register(tx, user_id.clone()).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket connection");
            if let Some(msg) = encode(&ServerMessage::Error {
                message: e.to_string(),
            }) {
                let _ = sender.send(msg).await;
            }
            return;
        }
    };

    let connected = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    let sent = match encode(&connected) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => false,
    };
    if !sent {
        tracing::error!(connection_id = %connection_id, "Failed to send connected message");
        hub.unregister(&connection_id).await;
        return;
    }

    let conn_id_for_send = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Some(frame) = encode(&msg) else { continue };
            if sender.send(frame).await.is_err() {
                tracing::debug!(
                    connection_id = %conn_id_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let hub_for_recv = hub.clone();
    let conn_id_for_recv = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    let conn = Conn {
                        hub: &hub_for_recv,
                        id: &conn_id_for_recv,
                        user_id: &user_id,
                    };
                    if !handle_ws_message(&conn, &notifications, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unregister(&connection_id).await;
}

/// One open connection and the user behind it
struct Conn<'a> {
    hub: &'a ConnectionHub,
    id: &'a str,
    user_id: &'a str,
}

/// Returns false if the connection should be closed.
async fn handle_ws_message(conn: &Conn<'_>, notifications: &NotificationStore, message: Message) -> bool {
    let (hub, connection_id) = (conn.hub, conn.id);
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(conn, notifications, client_msg).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "Invalid client message"
                    );
                    let error_msg = ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = hub.send_to(connection_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error_msg).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

async fn handle_client_message(conn: &Conn<'_>, notifications: &NotificationStore, message: ClientMessage) {
    let (hub, connection_id) = (conn.hub, conn.id);
    let reply = match message {
        ClientMessage::Subscribe { topics } => match hub.subscribe(connection_id, topics).await {
            Ok(topics) => Some(ServerMessage::Subscribed { topics }),
            Err(e) => Some(ServerMessage::Error {
                message: e.to_string(),
            }),
        },
        ClientMessage::Unsubscribe { topics } => {
            match hub.unsubscribe(connection_id, topics).await {
                Ok(topics) => Some(ServerMessage::Unsubscribed { topics }),
                Err(e) => Some(ServerMessage::Error {
                    message: e.to_string(),
                }),
            }
        }
        // The resulting list change reaches this connection through the relay.
        ClientMessage::MarkRead { id } => {
            if notifications.mark_read_for(&id, conn.user_id).await {
                None
            } else {
                Some(ServerMessage::Error {
                    message: format!("Notification {} not found", id),
                })
            }
        }
        ClientMessage::Clear => {
            notifications.clear_for(conn.user_id).await;
            None
        }
        ClientMessage::Ping => Some(ServerMessage::Pong),
    };

    if let Some(reply) = reply {
        let _ = hub.send_to(connection_id, reply).await;
    }
}
