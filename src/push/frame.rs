//! Push frames sent by gateways
//!
//! `{"type": "call", "tableId": "...", "tableNumber": 5, "deviceId": "..."}`

use serde::Deserialize;
use serde_json::Value;

use super::PushError;
use crate::models::{NotificationDraft, NotificationKind, UNKNOWN_TABLE};

pub const CALL_TITLE: &str = "Khách gọi nhân viên";
pub const REMINDER_TITLE: &str = "Nhắc nhở";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PushFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub table_id: Option<String>,
    /// Sent as a number or a string depending on firmware
    #[serde(default)]
    pub table_number: Option<Value>,
    #[serde(default)]
    pub device_id: Option<String>,
}

impl PushFrame {
    pub fn parse(text: &str) -> Result<Self, PushError> {
        serde_json::from_str(text).map_err(|e| PushError::InvalidFrame(e.to_string()))
    }

    /// Table number as shown to staff
    pub fn table_label(&self) -> String {
        match &self.table_number {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => UNKNOWN_TABLE.to_string(),
        }
    }

    /// Notification for call and reminder frames; other types are ignored
    pub fn to_draft(&self) -> Option<NotificationDraft> {
        let table = self.table_label();
        let (kind, title, fallback) = match self.kind.as_str() {
            "call" => (
                NotificationKind::Call,
                CALL_TITLE,
                format!("Bàn {} đang gọi nhân viên", table),
            ),
            "reminder" => (
                NotificationKind::Reminder,
                REMINDER_TITLE,
                format!("Bàn {} cần được nhắc nhở", table),
            ),
            _ => return None,
        };

        let message = self
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback);

        let mut draft = NotificationDraft::new(kind, title, message);
        draft.table_id = self.table_id.clone();
        draft.device_id = self.device_id.clone();
        Some(draft)
    }
}
