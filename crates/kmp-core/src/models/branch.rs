//! Branch domain model.
//!
//! Branches are the organizational tree (kingdom, region, local group)
//! that officer assignments are scoped to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default bound on walks up the branch tree and along office chains.
pub const MAX_HIERARCHY_DEPTH: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    /// `None` for a root branch.
    pub parent_id: Option<Uuid>,
    /// Free-form label such as `Kingdom` or `Barony`.
    pub branch_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Branch {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBranch {
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub branch_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBranch {
    pub name: Option<String>,
    pub branch_type: Option<String>,
    /// `Some(Some(id))` = re-parent, `Some(None)` = make root, `None` = no change.
    pub parent_id: Option<Option<Uuid>>,
}
