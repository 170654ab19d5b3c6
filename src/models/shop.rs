//! Shop records
//!
//! A shop is owned by one dashboard user and groups its tables,
//! gateways and devices.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Record, RecordId, Timestamp};

/// A restaurant or café registered by a dashboard user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shop {
    pub id: RecordId,
    /// Owning user (identity provider id)
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// How long after seating a table gets an automatic reminder
    pub reminder_time: u32,
    pub reminder_unit: ReminderUnit,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Shop {
    /// Reminder delay as a duration
    pub fn reminder_delay(&self) -> Duration {
        self.reminder_unit.duration(self.reminder_time)
    }

    /// Reminder delay in dashboard wording, e.g. "30 phút"
    pub fn reminder_label(&self) -> String {
        format!("{} {}", self.reminder_time, self.reminder_unit.label())
    }
}

/// Unit of a shop's reminder delay
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderUnit {
    Seconds,
    #[default]
    Minutes,
    Hours,
}

impl ReminderUnit {
    /// Convert an amount in this unit to a duration
    pub fn duration(self, amount: u32) -> Duration {
        let secs = u64::from(amount);
        match self {
            ReminderUnit::Seconds => Duration::from_secs(secs),
            ReminderUnit::Minutes => Duration::from_secs(secs * 60),
            ReminderUnit::Hours => Duration::from_secs(secs * 3600),
        }
    }

    /// Localized label shown in the dashboard
    pub fn label(self) -> &'static str {
        match self {
            ReminderUnit::Seconds => "giây",
            ReminderUnit::Minutes => "phút",
            ReminderUnit::Hours => "giờ",
        }
    }
}

impl std::fmt::Display for ReminderUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderUnit::Seconds => write!(f, "seconds"),
            ReminderUnit::Minutes => write!(f, "minutes"),
            ReminderUnit::Hours => write!(f, "hours"),
        }
    }
}

impl std::str::FromStr for ReminderUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "seconds" | "s" => Ok(ReminderUnit::Seconds),
            "minutes" | "m" => Ok(ReminderUnit::Minutes),
            "hours" | "h" => Ok(ReminderUnit::Hours),
            _ => Err(format!(
                "Invalid reminder unit: {}. Use seconds, minutes or hours",
                s
            )),
        }
    }
}

fn default_reminder_time() -> u32 {
    30
}

/// Insert payload for a shop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewShop {
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_reminder_time")]
    pub reminder_time: u32,
    #[serde(default)]
    pub reminder_unit: ReminderUnit,
}

impl NewShop {
    /// A shop form with the default reminder settings (30 minutes)
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            address: None,
            phone: None,
            email: None,
            reminder_time: default_reminder_time(),
            reminder_unit: ReminderUnit::default(),
        }
    }

    /// Builder method: set address
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Builder method: set phone
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Builder method: set email
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Builder method: set reminder delay
    pub fn reminder(mut self, time: u32, unit: ReminderUnit) -> Self {
        self.reminder_time = time;
        self.reminder_unit = unit;
        self
    }
}

/// Partial update for a shop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_unit: Option<ReminderUnit>,
}

impl Record for Shop {
    const TABLE: &'static str = "shops";
    type New = NewShop;
    type Patch = ShopPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_shop_default_reminder() {
        let shop = NewShop::new("user-1", "Café A");
        assert_eq!(shop.reminder_time, 30);
        assert_eq!(shop.reminder_unit, ReminderUnit::Minutes);
    }

    #[test]
    fn test_new_shop_deserialize_fills_defaults() {
        let shop: NewShop = serde_json::from_str(r#"{"name": "Café A"}"#).unwrap();
        assert_eq!(shop.reminder_time, 30);
        assert_eq!(shop.reminder_unit, ReminderUnit::Minutes);
        assert!(shop.address.is_none());
    }

    #[test]
    fn test_reminder_unit_duration() {
        assert_eq!(ReminderUnit::Seconds.duration(45), Duration::from_secs(45));
        assert_eq!(ReminderUnit::Minutes.duration(30), Duration::from_secs(1800));
        assert_eq!(ReminderUnit::Hours.duration(2), Duration::from_secs(7200));
    }

    #[test]
    fn test_reminder_unit_parse() {
        assert_eq!("HOURS".parse::<ReminderUnit>(), Ok(ReminderUnit::Hours));
        assert!("days".parse::<ReminderUnit>().is_err());
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = ShopPatch {
            name: Some("Café B".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Café B"}));
    }
}
