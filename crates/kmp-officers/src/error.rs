//! Officer error types.

use kmp_core::error::KmpError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OfficerError {
    #[error("Member is not warrantable")]
    MemberNotWarrantable { member_id: Uuid },

    #[error("office {office} cannot be held in a {branch_type} branch")]
    BranchTypeNotApplicable { office: String, branch_type: String },

    #[error("assignment would end before it starts")]
    InvalidWindow,

    #[error("branch hierarchy is deeper than {0} levels")]
    HierarchyTooDeep(usize),
}

impl From<OfficerError> for KmpError {
    fn from(err: OfficerError) -> Self {
        KmpError::Validation {
            message: err.to_string(),
        }
    }
}
