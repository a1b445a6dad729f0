//! Member domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    /// Society name; this is what officer listings display.
    pub sca_name: String,
    pub email_address: String,
    /// Eligible to hold offices that require a warrant.
    pub warrantable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    pub sca_name: String,
    pub email_address: String,
    pub warrantable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMember {
    pub sca_name: Option<String>,
    pub email_address: Option<String>,
    pub warrantable: Option<bool>,
}
