//! WebSocket Message Types
//!
//! Message formats exchanged between open dashboards and the server.

use serde::{Deserialize, Serialize};

use crate::models::{Notification, NotificationKind};
use crate::notifications::NotificationEvent;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics (e.g., "notifications.*", "push")
    Subscribe { topics: Vec<String> },
    Unsubscribe { topics: Vec<String> },
    /// Mark one notification read
    MarkRead { id: String },
    /// Clear every notification the caller can see
    Clear,
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A new notification arrived
    Notification { notification: Notification },
    NotificationRead { id: String },
    NotificationsCleared { ids: Vec<String> },
    /// Play the call sound
    PlaySound { sound: String },
    /// Push channel went up or down
    PushStatus { connected: bool },
    Subscribed { topics: Vec<String> },
    Unsubscribed { topics: Vec<String> },
    Pong,
    Error { message: String },
    /// Connection established
    Connected { connection_id: String },
}

/// Sound clip the dashboard plays for calls
pub const CALL_SOUND: &str = "/sounds/notification.mp3";

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to (e.g., "notifications.call")
    pub topic: String,
    /// Only connections signed in as this user receive it; `None` means all
    pub audience: Option<String>,
    pub message: ServerMessage,
}

impl WsEvent {
    /// Event for one notification list change
    pub fn from_notification_event(event: NotificationEvent) -> Self {
        let audience = event.owner_id().map(str::to_string);
        match event {
            NotificationEvent::Added { notification } => Self {
                topic: format!("notifications.{}", notification.kind),
                audience,
                message: ServerMessage::Notification { notification },
            },
            NotificationEvent::Read { id, .. } => Self {
                topic: "notifications.read".to_string(),
                audience,
                message: ServerMessage::NotificationRead { id },
            },
            NotificationEvent::Cleared { ids, .. } => Self {
                topic: "notifications.cleared".to_string(),
                audience,
                message: ServerMessage::NotificationsCleared { ids },
            },
        }
    }

    pub fn play_sound(sound: &str, audience: Option<String>) -> Self {
        Self {
            topic: format!("notifications.{}", NotificationKind::Call),
            audience,
            message: ServerMessage::PlaySound {
                sound: sound.to_string(),
            },
        }
    }

    pub fn push_status(connected: bool) -> Self {
        Self {
            topic: "push".to_string(),
            audience: None,
            message: ServerMessage::PushStatus { connected },
        }
    }
}
