//! Data Model
//!
//! Records persisted in the remote store, plus the client-only
//! notification record.
//!
//! Every persisted type implements [`Record`], which ties it to its
//! remote table and to the payloads used to create and patch it.

mod contact;
mod device;
mod gateway;
mod message;
mod notification;
mod profile;
mod reminder;
mod shop;
mod table;

pub use contact::{ContactSubmission, NewContactSubmission};
pub use device::{Device, DevicePatch, DeviceStatus, NewDevice};
pub use gateway::{Gateway, GatewayPatch, GatewayStatus, NewGateway};
pub use message::{DeviceMessage, MessageKind, MessagePatch, NewDeviceMessage};
pub use notification::{Notification, NotificationDraft, NotificationKind};
pub use profile::{NewUserProfile, UserProfile};
pub use reminder::{NewReminder, Reminder, ReminderOrigin, ReminderPatch, ReminderStatus};
pub use shop::{NewShop, ReminderUnit, Shop, ShopPatch};
pub use table::{DiningTable, NewDiningTable, TableStatus, TablePatch};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Identifier assigned by the remote store (UUID text).
pub type RecordId = String;

/// Timestamp type used by every persisted row
pub type Timestamp = DateTime<Utc>;

/// A row type stored in a remote table
pub trait Record: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Remote table name
    const TABLE: &'static str;

    /// Insert payload (everything except id and timestamps)
    type New: Serialize + Send + Sync;

    /// Partial update payload; `None` fields are left untouched
    type Patch: Serialize + Send + Sync;

    /// Store-generated identifier
    fn id(&self) -> &str;
}

/// Shown for tables that have no number, mirroring how the dashboard
/// prints an unknown table.
pub(crate) const UNKNOWN_TABLE: &str = "?";
