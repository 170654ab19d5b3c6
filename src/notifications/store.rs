//! Notification list
//!
//! Newest first, unbounded, in memory only. Every change is broadcast as a
//! [`NotificationEvent`] so open dashboards can follow along.
//!
//! Reads and mutations are scoped to one user: a user sees the
//! notifications of the shops they own plus the unowned ones from the push
//! channel.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use super::chime::{Chime, SilentChime};
use crate::models::{Notification, NotificationDraft, NotificationKind};
use crate::push::PushFrame;

const EVENT_CAPACITY: usize = 256;

/// A change to the notification list
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    Added {
        notification: Notification,
    },
    Read {
        id: String,
        #[serde(skip)]
        owner_id: Option<String>,
    },
    Cleared {
        ids: Vec<String>,
        #[serde(skip)]
        owner_id: Option<String>,
    },
}

impl NotificationEvent {
    /// The user this event concerns; `None` for shared notifications
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Self::Added { notification } => notification.owner_id.as_deref(),
            Self::Read { owner_id, .. } | Self::Cleared { owner_id, .. } => owner_id.as_deref(),
        }
    }
}

pub struct NotificationStore {
    items: RwLock<Vec<Notification>>,
    events: broadcast::Sender<NotificationEvent>,
    chime: Arc<dyn Chime>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(Arc::new(SilentChime))
    }
}

impl NotificationStore {
    pub fn new(chime: Arc<dyn Chime>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            items: RwLock::new(Vec::new()),
            events,
            chime,
        }
    }

    /// Stamp and prepend a notification; calls also ring the chime
    pub async fn add(&self, draft: NotificationDraft) -> Notification {
        let notification = Notification::from_draft(draft);
        self.items.write().await.insert(0, notification.clone());

        tracing::info!(
            id = %notification.id,
            kind = %notification.kind,
            table_id = ?notification.table_id,
            "Notification added"
        );

        if notification.kind == NotificationKind::Call {
            if let Err(e) = self.chime.play(&notification) {
                tracing::warn!(error = %e, "Could not play notification sound");
            }
        }

        let _ = self.events.send(NotificationEvent::Added {
            notification: notification.clone(),
        });
        notification
    }

    /// Turn a push frame into a notification, if it is a call or reminder
    pub async fn ingest_frame(&self, text: &str) -> Option<Notification> {
        let frame = match PushFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable push frame");
                return None;
            }
        };

        match frame.to_draft() {
            Some(draft) => Some(self.add(draft).await),
            None => {
                tracing::debug!(kind = %frame.kind, "Ignoring push frame");
                None
            }
        }
    }

    /// Mark one notification read; `false` if `user_id` cannot see it
    pub async fn mark_read_for(&self, id: &str, user_id: &str) -> bool {
        let owner_id = {
            let mut items = self.items.write().await;
            match items.iter_mut().find(|n| n.id == id && n.visible_to(user_id)) {
                Some(notification) => {
                    notification.read = true;
                    Some(notification.owner_id.clone())
                }
                None => None,
            }
        };

        match owner_id {
            Some(owner_id) => {
                let _ = self.events.send(NotificationEvent::Read {
                    id: id.to_string(),
                    owner_id,
                });
                true
            }
            None => false,
        }
    }

    /// Remove every notification `user_id` can see; returns how many
    pub async fn clear_for(&self, user_id: &str) -> usize {
        let mut owned = Vec::new();
        let mut shared = Vec::new();
        self.items.write().await.retain(|n| {
            if !n.visible_to(user_id) {
                return true;
            }
            match n.owner_id {
                Some(_) => owned.push(n.id.clone()),
                None => shared.push(n.id.clone()),
            }
            false
        });

        let removed = owned.len() + shared.len();
        if !owned.is_empty() {
            let _ = self.events.send(NotificationEvent::Cleared {
                ids: owned,
                owner_id: Some(user_id.to_string()),
            });
        }
        if !shared.is_empty() {
            let _ = self.events.send(NotificationEvent::Cleared {
                ids: shared,
                owner_id: None,
            });
        }
        tracing::debug!(user_id = %user_id, removed, "Notifications cleared");
        removed
    }

    /// Snapshot, newest first
    pub async fn list(&self) -> Vec<Notification> {
        self.items.read().await.clone()
    }

    /// Snapshot of what `user_id` can see, newest first
    pub async fn list_for(&self, user_id: &str) -> Vec<Notification> {
        self.items
            .read()
            .await
            .iter()
            .filter(|n| n.visible_to(user_id))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn unread_count_for(&self, user_id: &str) -> usize {
        self.items
            .read()
            .await
            .iter()
            .filter(|n| !n.read && n.visible_to(user_id))
            .count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// Feed every push frame from `frames` into the store until the
    /// channel closes
    pub fn spawn_feed(self: &Arc<Self>, mut frames: broadcast::Receiver<String>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match frames.recv().await {
                    Ok(text) => {
                        store.ingest_frame(&text).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notification feed lagged behind push channel");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Notification feed stopped");
        })
    }
}
