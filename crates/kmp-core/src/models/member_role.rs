//! Member role grant model.
//!
//! Offices may grant a role to their holder for the duration of the
//! assignment. Grants are owned by the active-window manager, which creates
//! them when a window starts and expires them when it stops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::window::WindowStatus;

pub const MEMBER_ROLE_ENTITY: &str = "member_role";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRole {
    pub id: Uuid,
    pub member_id: Uuid,
    pub role_id: Uuid,
    pub branch_id: Option<Uuid>,
    /// Entity tag of the record that caused the grant (e.g. `officer`).
    pub entity_type: String,
    pub entity_id: Uuid,
    pub approver_id: Uuid,
    pub start_on: DateTime<Utc>,
    pub expires_on: Option<DateTime<Utc>>,
    pub revoker_id: Option<Uuid>,
    pub status: WindowStatus,
    pub created_at: DateTime<Utc>,
}
