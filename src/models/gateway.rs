//! Gateway records

use serde::{Deserialize, Serialize};

use super::{Record, RecordId, Timestamp};

/// A shop-local gateway that relays device traffic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Gateway {
    pub id: RecordId,
    pub shop_id: RecordId,
    pub name: String,
    pub server_ip: String,
    pub web_server_port: u16,
    pub websocket_port: u16,
    pub status: GatewayStatus,
    #[serde(default)]
    pub connected_devices: u32,
    #[serde(default)]
    pub last_seen: Option<Timestamp>,
    #[serde(default)]
    pub version: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Gateway {
    /// Push-channel address advertised by this gateway
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}", self.server_ip, self.websocket_port)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Online,
    #[default]
    Offline,
    Error,
}

impl GatewayStatus {
    pub fn label(self) -> &'static str {
        match self {
            GatewayStatus::Online => "Trực tuyến",
            GatewayStatus::Offline => "Ngoại tuyến",
            GatewayStatus::Error => "Lỗi",
        }
    }
}

impl std::fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayStatus::Online => write!(f, "online"),
            GatewayStatus::Offline => write!(f, "offline"),
            GatewayStatus::Error => write!(f, "error"),
        }
    }
}

fn default_web_server_port() -> u16 {
    8080
}

fn default_websocket_port() -> u16 {
    8081
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Insert payload for a gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewGateway {
    #[serde(default)]
    pub shop_id: RecordId,
    pub name: String,
    pub server_ip: String,
    #[serde(default = "default_web_server_port")]
    pub web_server_port: u16,
    #[serde(default = "default_websocket_port")]
    pub websocket_port: u16,
    #[serde(default)]
    pub status: GatewayStatus,
    #[serde(default)]
    pub connected_devices: u32,
    #[serde(default = "default_version")]
    pub version: String,
}

impl NewGateway {
    pub fn new(
        shop_id: impl Into<String>,
        name: impl Into<String>,
        server_ip: impl Into<String>,
    ) -> Self {
        Self {
            shop_id: shop_id.into(),
            name: name.into(),
            server_ip: server_ip.into(),
            web_server_port: default_web_server_port(),
            websocket_port: default_websocket_port(),
            status: GatewayStatus::default(),
            connected_devices: 0,
            version: default_version(),
        }
    }
}

/// Partial update for a gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_server_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websocket_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GatewayStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_devices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Record for Gateway {
    const TABLE: &'static str = "gateways";
    type New = NewGateway;
    type Patch = GatewayPatch;

    fn id(&self) -> &str {
        &self.id
    }
}
