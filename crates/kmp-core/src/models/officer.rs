//! Officer assignment model.
//!
//! An officer is a time-boxed assignment of a member to an office within a
//! branch. The `reports_to_*` and `deputy_to_*` fields are a snapshot taken
//! at assignment time naming an office/branch slot, not a particular person:
//! whoever currently holds that slot is resolved on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::window::WindowStatus;

/// Entity tag used for officers when talking to the active-window manager.
pub const OFFICER_ENTITY: &str = "officer";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Officer {
    pub id: Uuid,
    pub member_id: Uuid,
    pub branch_id: Uuid,
    pub office_id: Uuid,
    pub status: WindowStatus,
    pub start_on: DateTime<Utc>,
    /// `None` for an open-ended assignment.
    pub expires_on: Option<DateTime<Utc>>,
    pub reports_to_office_id: Option<Uuid>,
    pub reports_to_branch_id: Option<Uuid>,
    pub deputy_to_office_id: Option<Uuid>,
    pub deputy_to_branch_id: Option<Uuid>,
    pub deputy_description: Option<String>,
    /// Office contact address; empty when none was given.
    pub email_address: String,
    pub approver_id: Uuid,
    pub approval_date: DateTime<Utc>,
    pub revoker_id: Option<Uuid>,
    pub revoked_reason: Option<String>,
    pub granted_member_role_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Officer {
    pub fn reporting(&self) -> ReportingFields {
        ReportingFields {
            reports_to_office_id: self.reports_to_office_id,
            reports_to_branch_id: self.reports_to_branch_id,
            deputy_to_office_id: self.deputy_to_office_id,
            deputy_to_branch_id: self.deputy_to_branch_id,
        }
    }
}

/// Reporting snapshot computed when an officer is assigned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReportingFields {
    pub reports_to_office_id: Option<Uuid>,
    pub reports_to_branch_id: Option<Uuid>,
    pub deputy_to_office_id: Option<Uuid>,
    pub deputy_to_branch_id: Option<Uuid>,
}

/// Fields required to create a new officer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfficer {
    pub member_id: Uuid,
    pub branch_id: Uuid,
    pub office_id: Uuid,
    pub status: WindowStatus,
    pub start_on: DateTime<Utc>,
    pub expires_on: Option<DateTime<Utc>>,
    pub reporting: ReportingFields,
    pub deputy_description: Option<String>,
    pub email_address: String,
    pub approver_id: Uuid,
}
