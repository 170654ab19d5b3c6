//! User profile records, written once after registration

use serde::{Deserialize, Serialize};

use super::{Record, RecordId, Timestamp};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: RecordId,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub business_name: String,
    #[serde(default)]
    pub business_type: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub newsletter_subscribed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUserProfile {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub business_name: String,
    pub business_type: String,
    pub notes: String,
    pub newsletter_subscribed: bool,
}

impl Record for UserProfile {
    const TABLE: &'static str = "user_profiles";
    type New = NewUserProfile;
    // Profiles are never edited from the dashboard.
    type Patch = NewUserProfile;

    fn id(&self) -> &str {
        &self.id
    }
}
