//! Reminder records

use serde::{Deserialize, Serialize};

use super::{Record, RecordId, Timestamp};

/// A reminder pushed to a table's device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: RecordId,
    pub table_id: RecordId,
    pub device_id: RecordId,
    pub scheduled_time: Timestamp,
    #[serde(default)]
    pub sent_time: Option<Timestamp>,
    pub status: ReminderStatus,
    pub message: String,
    #[serde(rename = "type")]
    pub origin: ReminderOrigin,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Scheduled,
    Sent,
    Failed,
    Cancelled,
}

impl ReminderStatus {
    pub fn label(self) -> &'static str {
        match self {
            ReminderStatus::Scheduled => "Đã lên lịch",
            ReminderStatus::Sent => "Đã gửi",
            ReminderStatus::Failed => "Thất bại",
            ReminderStatus::Cancelled => "Đã hủy",
        }
    }
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderStatus::Scheduled => write!(f, "scheduled"),
            ReminderStatus::Sent => write!(f, "sent"),
            ReminderStatus::Failed => write!(f, "failed"),
            ReminderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for ReminderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(ReminderStatus::Scheduled),
            "sent" => Ok(ReminderStatus::Sent),
            "failed" => Ok(ReminderStatus::Failed),
            "cancelled" => Ok(ReminderStatus::Cancelled),
            _ => Err(format!(
                "Invalid reminder status: {}. Use scheduled, sent, failed or cancelled",
                s
            )),
        }
    }
}

/// Whether a reminder was created by the shop's timer or by staff
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderOrigin {
    Auto,
    #[default]
    Manual,
}

/// Insert payload for a reminder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewReminder {
    pub table_id: RecordId,
    pub device_id: RecordId,
    pub scheduled_time: Timestamp,
    #[serde(default)]
    pub status: ReminderStatus,
    pub message: String,
    #[serde(rename = "type", default)]
    pub origin: ReminderOrigin,
}

/// Partial update for a reminder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReminderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Record for Reminder {
    const TABLE: &'static str = "reminders";
    type New = NewReminder;
    type Patch = ReminderPatch;

    fn id(&self) -> &str {
        &self.id
    }
}
