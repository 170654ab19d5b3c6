//! Landing-page contact form submissions

use serde::{Deserialize, Serialize};

use super::{Record, RecordId, Timestamp};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactSubmission {
    pub id: RecordId,
    pub name: String,
    pub business: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub business: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Record for ContactSubmission {
    const TABLE: &'static str = "form_submissions";
    type New = NewContactSubmission;
    type Patch = NewContactSubmission;

    fn id(&self) -> &str {
        &self.id
    }
}
