//! Device records
//!
//! A device sits on a table (or is unlinked), talks through a gateway and
//! shows the shop's rotating messages.

use serde::{Deserialize, Deserializer, Serialize};

use super::{Record, RecordId, Timestamp};

/// An IoT table device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub id: RecordId,
    pub shop_id: RecordId,
    pub gateway_id: RecordId,
    /// Linked table; `None` while the device is unlinked
    #[serde(default)]
    pub table_id: Option<RecordId>,
    pub code: String,
    pub name: String,
    pub status: DeviceStatus,
    pub battery_level: u8,
    #[serde(default)]
    pub last_seen: Option<Timestamp>,
    #[serde(default)]
    pub version: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Device {
    pub fn is_linked(&self) -> bool {
        self.table_id.is_some()
    }

    pub fn is_online(&self) -> bool {
        self.status == DeviceStatus::Online
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    #[default]
    Offline,
    LowBattery,
}

impl DeviceStatus {
    pub fn label(self) -> &'static str {
        match self {
            DeviceStatus::Online => "Trực tuyến",
            DeviceStatus::Offline => "Ngoại tuyến",
            DeviceStatus::LowBattery => "Pin yếu",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Online => write!(f, "online"),
            DeviceStatus::Offline => write!(f, "offline"),
            DeviceStatus::LowBattery => write!(f, "low_battery"),
        }
    }
}

fn default_battery_level() -> u8 {
    100
}

fn default_version() -> String {
    "v2.1.0".to_string()
}

/// Insert payload for a device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDevice {
    #[serde(default)]
    pub shop_id: RecordId,
    pub gateway_id: RecordId,
    #[serde(default)]
    pub table_id: Option<RecordId>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default = "default_battery_level")]
    pub battery_level: u8,
    #[serde(default = "default_version")]
    pub version: String,
}

impl NewDevice {
    pub fn new(
        shop_id: impl Into<String>,
        gateway_id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            shop_id: shop_id.into(),
            gateway_id: gateway_id.into(),
            table_id: None,
            code: code.into(),
            name: name.into(),
            status: DeviceStatus::default(),
            battery_level: default_battery_level(),
            version: default_version(),
        }
    }

    /// Builder method: link to a table
    pub fn table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }
}

/// Partial update for a device
///
/// `table_id` distinguishes "leave alone" (`None`) from "unlink"
/// (`Some(None)`), which is sent to the store as `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<RecordId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_some"
    )]
    pub table_id: Option<Option<RecordId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DevicePatch {
    /// Patch that links (or with `None`, unlinks) a table
    pub fn link(table_id: Option<RecordId>) -> Self {
        Self {
            table_id: Some(table_id),
            ..Default::default()
        }
    }
}

fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl Record for Device {
    const TABLE: &'static str = "devices";
    type New = NewDevice;
    type Patch = DevicePatch;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlink_patch_sends_null() {
        let json = serde_json::to_value(DevicePatch::link(None)).unwrap();
        assert_eq!(json, serde_json::json!({"table_id": null}));
    }

    #[test]
    fn test_patch_deserialize_distinguishes_null() {
        let unlink: DevicePatch = serde_json::from_str(r#"{"table_id": null}"#).unwrap();
        assert_eq!(unlink.table_id, Some(None));

        let untouched: DevicePatch = serde_json::from_str(r#"{"name": "D1"}"#).unwrap();
        assert_eq!(untouched.table_id, None);
    }

    #[test]
    fn test_status_snake_case() {
        let status: DeviceStatus = serde_json::from_str("\"low_battery\"").unwrap();
        assert_eq!(status, DeviceStatus::LowBattery);
        assert_eq!(status.to_string(), "low_battery");
    }
}
