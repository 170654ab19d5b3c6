//! Dining table records

use serde::{Deserialize, Serialize};

use super::{Record, RecordId, Timestamp};

/// A table in a shop; a device may be linked to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    pub id: RecordId,
    pub shop_id: RecordId,
    /// Number or label printed on the table
    pub number: String,
    #[serde(default)]
    pub details: Option<String>,
    pub status: TableStatus,
    #[serde(default)]
    pub last_reminder: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Occupancy of a table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    #[default]
    Empty,
    Occupied,
    Reserved,
}

impl TableStatus {
    pub fn label(self) -> &'static str {
        match self {
            TableStatus::Empty => "Trống",
            TableStatus::Occupied => "Có khách",
            TableStatus::Reserved => "Đã đặt",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Empty => write!(f, "empty"),
            TableStatus::Occupied => write!(f, "occupied"),
            TableStatus::Reserved => write!(f, "reserved"),
        }
    }
}

impl std::str::FromStr for TableStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "empty" => Ok(TableStatus::Empty),
            "occupied" => Ok(TableStatus::Occupied),
            "reserved" => Ok(TableStatus::Reserved),
            _ => Err(format!(
                "Invalid table status: {}. Use empty, occupied or reserved",
                s
            )),
        }
    }
}

/// Insert payload for a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDiningTable {
    #[serde(default)]
    pub shop_id: RecordId,
    pub number: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status: TableStatus,
}

impl NewDiningTable {
    pub fn new(shop_id: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.into(),
            number: number.into(),
            details: None,
            status: TableStatus::Empty,
        }
    }
}

/// Partial update for a table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TablePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reminder: Option<Timestamp>,
}

impl Record for DiningTable {
    const TABLE: &'static str = "tables";
    type New = NewDiningTable;
    type Patch = TablePatch;

    fn id(&self) -> &str {
        &self.id
    }
}
