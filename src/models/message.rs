//! Device message records

use serde::{Deserialize, Serialize};

use super::{Record, RecordId, Timestamp};

/// A message a device shows in rotation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceMessage {
    pub id: RecordId,
    pub device_id: RecordId,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Greeting,
    Reminder,
    Promotion,
    Farewell,
    #[default]
    Custom,
}

impl MessageKind {
    pub fn label(self) -> &'static str {
        match self {
            MessageKind::Greeting => "Chào mừng",
            MessageKind::Reminder => "Nhắc nhở",
            MessageKind::Promotion => "Khuyến mãi",
            MessageKind::Farewell => "Tạm biệt",
            MessageKind::Custom => "Tùy chỉnh",
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greeting" => Ok(MessageKind::Greeting),
            "reminder" => Ok(MessageKind::Reminder),
            "promotion" => Ok(MessageKind::Promotion),
            "farewell" => Ok(MessageKind::Farewell),
            "custom" => Ok(MessageKind::Custom),
            _ => Err(format!(
                "Invalid message type: {}. Use greeting, reminder, promotion, farewell or custom",
                s
            )),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Insert payload for a device message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDeviceMessage {
    #[serde(default)]
    pub device_id: RecordId,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewDeviceMessage {
    pub fn new(device_id: impl Into<String>, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            device_id: device_id.into(),
            content: content.into(),
            kind,
            is_active: true,
        }
    }
}

/// Partial update for a device message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Record for DeviceMessage {
    const TABLE: &'static str = "device_messages";
    type New = NewDeviceMessage;
    type Patch = MessagePatch;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_uses_type_field() {
        let msg = NewDeviceMessage::new("dev-1", "Xin chào!", MessageKind::Greeting);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "greeting");
        assert_eq!(json["is_active"], true);
    }
}
