//! Data Transfer Objects
//!
//! Request and response types for the API endpoints that are not plain
//! records. Create and update bodies reuse the record insert/patch types.

use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, Session};
use crate::dashboard::{DeviceRow, DeviceStats, ReminderCounts, TableCounts};
use crate::models::{
    DiningTable, Gateway, MessageKind, Notification, Reminder, ReminderStatus, Timestamp,
};
use crate::push::PushStatus;

// ============================================
// AUTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: AuthUser,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub session: Session,
    pub message: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================
// LIST DTOs
// ============================================

/// Records of one kind
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GatewayListResponse {
    pub gateways: Vec<Gateway>,
    pub total: usize,
    pub online: usize,
}

#[derive(Debug, Serialize)]
pub struct TableListResponse {
    pub tables: Vec<DiningTable>,
    pub counts: TableCounts,
}

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub devices: Vec<DeviceRow>,
    pub stats: DeviceStats,
}

#[derive(Debug, Serialize)]
pub struct ReminderListResponse {
    pub reminders: Vec<Reminder>,
    pub counts: ReminderCounts,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

// ============================================
// REQUEST DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

#[derive(Debug, Deserialize)]
pub struct CreateReminderRequest {
    pub table_id: String,
    pub device_id: String,
    pub message: String,
    /// Defaults to now
    #[serde(default)]
    pub scheduled_time: Option<Timestamp>,
}

/// Query string for reminder lists
#[derive(Debug, Default, Deserialize)]
pub struct ReminderFilter {
    #[serde(default)]
    pub status: Option<ReminderStatus>,
}

/// Query string for the table picker
#[derive(Debug, Default, Deserialize)]
pub struct AvailableTablesQuery {
    /// Device being edited; its own table stays selectable
    #[serde(default)]
    pub device_id: Option<String>,
}

// ============================================
// ACTION DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct RemindResponse {
    pub table: DiningTable,
    pub notification: Notification,
}

#[derive(Debug, Serialize)]
pub struct ReminderSentResponse {
    pub reminder: Reminder,
    pub notification: Notification,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PushStatusResponse {
    pub configured: bool,
    #[serde(flatten)]
    pub status: Option<PushStatus>,
}

// ============================================
// HEALTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy", "degraded" or "unhealthy"
    pub status: String,
    pub store: String,
    /// "connected", "disconnected" or "disabled"
    pub push: String,
    pub websocket_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
