//! WebSocket Connection Hub
//!
//! Tracks open dashboard connections and their topic subscriptions, and
//! fans published events out to matching subscribers.
//!
//! Lock order is `connections` then `subscriptions`; never hold
//! `subscriptions` while acquiring `connections`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent};
use crate::models::Notification;
use crate::notifications::{Chime, ChimeError};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
struct ConnectionHandle {
    sender: mpsc::UnboundedSender<ServerMessage>,
    /// Signed-in user behind the connection
    user_id: String,
    subscriptions: HashSet<String>,
}

#[derive(Default)]
struct HubInner {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Topic → subscribed connections
    subscriptions: RwLock<HashMap<String, HashSet<ConnectionId>>>,
}

/// Manages all WebSocket connections and subscriptions
#[derive(Clone)]
pub struct ConnectionHub {
    inner: Arc<HubInner>,
    config: HubConfig,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner::default()),
            config,
        }
    }

    /// Register a new connection, subject to the connection limit
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
        user_id: impl Into<String>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.inner.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                user_id: user_id.into(),
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and drop its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.inner.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.inner.subscriptions.write().await;
            for topic in handle.subscriptions {
                remove_subscriber(&mut subs, &topic, id);
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics; invalid topics are skipped
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.inner.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.inner.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            subs.entry(topic.clone()).or_default().insert(id.to_string());
            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    pub async fn unsubscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.inner.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.inner.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic) {
                remove_subscriber(&mut subs, &topic, id);
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed from topics");
        Ok(unsubscribed)
    }

    /// Send an event to every subscriber of its topic or its wildcard
    /// (`notifications.*` matches `notifications.call`), limited to the
    /// event's audience
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        let targets: HashSet<ConnectionId> = {
            let subs = self.inner.subscriptions.read().await;
            let mut targets = HashSet::new();
            if let Some(ids) = subs.get(&event.topic) {
                targets.extend(ids.iter().cloned());
            }
            if let Some((prefix, _)) = event.topic.split_once('.') {
                if let Some(ids) = subs.get(&format!("{}.*", prefix)) {
                    targets.extend(ids.iter().cloned());
                }
            }
            targets
        };
        if targets.is_empty() {
            return 0;
        }

        let connections = self.inner.connections.read().await;
        let mut sent = 0;
        for id in &targets {
            let Some(handle) = connections.get(id) else {
                continue;
            };
            if let Some(audience) = &event.audience {
                if &handle.user_id != audience {
                    continue;
                }
            }
            if handle.sender.send(event.message.clone()).is_ok() {
                sent += 1;
            }
        }

        if sent > 0 {
            tracing::trace!(topic = %event.topic, subscribers = sent, "Broadcast event");
        }
        sent
    }

    /// Broadcast from synchronous code
    pub fn publish(&self, event: WsEvent) {
        let hub = self.clone();
        tokio::spawn(async move {
            hub.broadcast(&event).await;
        });
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.inner.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle.sender.send(message).map_err(|_| HubError::SendFailed)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.connections.read().await.len()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.inner
            .subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

fn remove_subscriber(subs: &mut HashMap<String, HashSet<ConnectionId>>, topic: &str, id: &str) {
    if let Some(subscribers) = subs.get_mut(topic) {
        subscribers.remove(id);
        if subscribers.is_empty() {
            subs.remove(topic);
        }
    }
}

/// Valid topics:
/// - `notifications.*` (all notification traffic)
/// - `notifications.{call|reminder|system|read|cleared}`
/// - `push` (push channel status)
/// - `system`
fn is_valid_topic(topic: &str) -> bool {
    match topic.strip_prefix("notifications.") {
        Some(rest) => matches!(rest, "*" | "call" | "reminder" | "system" | "read" | "cleared"),
        None => topic == "push" || topic == "system",
    }
}

/// Plays the call sound in the dashboards that can see the call
pub struct HubChime {
    hub: ConnectionHub,
    sound: String,
}

impl HubChime {
    pub fn new(hub: ConnectionHub, sound: impl Into<String>) -> Self {
        Self {
            hub,
            sound: sound.into(),
        }
    }
}

impl Chime for HubChime {
    fn play(&self, notification: &Notification) -> Result<(), ChimeError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ChimeError::NoListeners);
        }
        self.hub.publish(WsEvent::play_sound(
            &self.sound,
            notification.owner_id.clone(),
        ));
        Ok(())
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationDraft, NotificationKind};
    use crate::notifications::NotificationEvent;

    fn call_event() -> WsEvent {
        let notification = Notification::from_draft(NotificationDraft::new(
            NotificationKind::Call,
            "Khách gọi nhân viên",
            "Bàn 2 đang gọi nhân viên",
        ));
        WsEvent::from_notification_event(NotificationEvent::Added { notification })
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic("notifications.*"));
        assert!(is_valid_topic("notifications.call"));
        assert!(is_valid_topic("notifications.cleared"));
        assert!(is_valid_topic("push"));
        assert!(is_valid_topic("system"));

        assert!(!is_valid_topic("notifications.bogus"));
        assert!(!is_valid_topic("metrics.mood"));
        assert!(!is_valid_topic(""));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx, "owner-1").await.unwrap();
        assert_eq!(hub.connection_count().await, 1);

        hub.subscribe(&id, vec!["push".to_string()]).await.unwrap();
        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.subscription_count("push").await, 0);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig { max_connections: 1 });
        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();

        hub.register(tx1, "owner-1").await.unwrap();
        let result = hub.register(tx2, "owner-1").await;
        assert!(matches!(result, Err(HubError::TooManyConnections(1))));
    }

    #[tokio::test]
    async fn test_broadcast_to_subscribers_only() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1, "owner-1").await.unwrap();
        hub.register(tx2, "owner-1").await.unwrap();
        hub.subscribe(&id1, vec!["notifications.call".to_string()])
            .await
            .unwrap();

        assert_eq!(hub.broadcast(&call_event()).await, 1);
        assert!(matches!(rx1.try_recv(), Ok(ServerMessage::Notification { .. })));
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wildcard_subscription() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx, "owner-1").await.unwrap();

        hub.subscribe(&id, vec!["notifications.*".to_string(), "notifications.call".to_string()])
            .await
            .unwrap();

        // Delivered once even though two subscriptions match.
        assert_eq!(hub.broadcast(&call_event()).await, 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_respects_audience() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let id1 = hub.register(tx1, "owner-1").await.unwrap();
        let id2 = hub.register(tx2, "owner-2").await.unwrap();
        for id in [&id1, &id2] {
            hub.subscribe(id, vec!["notifications.*".to_string()]).await.unwrap();
        }

        let mut event = call_event();
        event.audience = Some("owner-2".to_string());
        assert_eq!(hub.broadcast(&event).await, 1);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());

        // Shared events reach everyone
        assert_eq!(hub.broadcast(&call_event()).await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_broadcast_concurrent_with_subscribe() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx, "owner-1").await.unwrap();
        hub.subscribe(&id, vec!["notifications.call".to_string()])
            .await
            .unwrap();

        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..200 {
                    hub.broadcast(&call_event()).await;
                }
            }));
        }
        for _ in 0..4 {
            let hub = hub.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..200 {
                    hub.subscribe(&id, vec!["push".to_string()]).await.unwrap();
                    hub.unsubscribe(&id, vec!["push".to_string()]).await.unwrap();
                }
            }));
        }

        let all = async {
            for task in tasks {
                task.await.unwrap();
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(10), all)
            .await
            .expect("hub deadlocked");

        hub.unregister(&id).await;
        drain.abort();
    }
}
