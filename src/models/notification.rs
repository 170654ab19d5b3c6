//! Notification records
//!
//! Notifications live only in memory; they are never written to the
//! remote store. A notification raised from a shop's page belongs to that
//! shop's owner; one from the push channel has no owner and is shown to
//! every signed-in user of the deployment.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{RecordId, Shop, Timestamp};

/// A notification shown in the dashboard header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<RecordId>,
    /// Owner of `shop_id`; never sent to clients
    #[serde(default, skip_serializing)]
    pub owner_id: Option<String>,
    pub time: Timestamp,
}

impl Notification {
    /// Stamp a draft with a fresh id and the current time, unread
    pub fn from_draft(draft: NotificationDraft) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            read: false,
            table_id: draft.table_id,
            device_id: draft.device_id,
            shop_id: draft.shop_id,
            owner_id: draft.owner_id,
            time: Utc::now(),
        }
    }

    /// Unowned notifications are visible to everyone
    pub fn visible_to(&self, user_id: &str) -> bool {
        self.owner_id.as_deref().map_or(true, |owner| owner == user_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Call,
    Reminder,
    System,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Call => write!(f, "call"),
            NotificationKind::Reminder => write!(f, "reminder"),
            NotificationKind::System => write!(f, "system"),
        }
    }
}

/// Notification contents before id, time and read flag are assigned
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub table_id: Option<RecordId>,
    #[serde(default)]
    pub device_id: Option<RecordId>,
    #[serde(default)]
    pub shop_id: Option<RecordId>,
    #[serde(skip)]
    pub owner_id: Option<String>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            table_id: None,
            device_id: None,
            shop_id: None,
            owner_id: None,
        }
    }

    /// Builder method: reference a table
    pub fn table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    /// Builder method: reference a device
    pub fn device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Builder method: scope to a shop and its owner
    pub fn shop(mut self, shop: &Shop) -> Self {
        self.shop_id = Some(shop.id.clone());
        self.owner_id = Some(shop.user_id.clone());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewShop;

    fn shop(owner: &str) -> Shop {
        let now = Utc::now();
        let form = NewShop::new(owner, "Café A");
        Shop {
            id: "shop-1".to_string(),
            user_id: form.user_id,
            name: form.name,
            address: None,
            phone: None,
            email: None,
            reminder_time: form.reminder_time,
            reminder_unit: form.reminder_unit,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_visibility_follows_shop_owner() {
        let scoped = Notification::from_draft(
            NotificationDraft::new(NotificationKind::Reminder, "t", "m").shop(&shop("owner-1")),
        );
        assert_eq!(scoped.shop_id.as_deref(), Some("shop-1"));
        assert!(scoped.visible_to("owner-1"));
        assert!(!scoped.visible_to("owner-2"));

        let shared = Notification::from_draft(NotificationDraft::new(NotificationKind::Call, "t", "m"));
        assert!(shared.visible_to("owner-2"));
    }

    #[test]
    fn test_owner_not_serialized() {
        let n = Notification::from_draft(
            NotificationDraft::new(NotificationKind::Reminder, "t", "m").shop(&shop("owner-1")),
        );
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["shop_id"], "shop-1");
        assert!(json.get("owner_id").is_none());
    }
}
