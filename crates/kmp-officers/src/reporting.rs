//! Reporting snapshot taken when an officer is assigned.
//!
//! The snapshot names an office/branch slot, never a person. A deputy
//! reports to its principal office in its own branch. Any other office
//! reports to its superior office one branch up, or, when the office may
//! skip vacant levels, to the nearest ancestor where the superior office is
//! currently held.

use kmp_core::error::KmpResult;
use kmp_core::models::branch::Branch;
use kmp_core::models::office::Office;
use kmp_core::models::officer::ReportingFields;
use kmp_core::repository::{BranchRepository, OfficerRepository};
use tracing::debug;
use uuid::Uuid;

use crate::error::OfficerError;

/// Compute the reporting snapshot for an assignment of `office` in `branch`.
pub async fn calculate_reporting_fields<B, O>(
    branches: &B,
    officers: &O,
    office: &Office,
    branch: &Branch,
    max_depth: usize,
) -> KmpResult<ReportingFields>
where
    B: BranchRepository,
    O: OfficerRepository,
{
    if let Some(principal) = office.deputy_to_id() {
        return Ok(ReportingFields {
            reports_to_office_id: Some(principal),
            reports_to_branch_id: Some(branch.id),
            deputy_to_office_id: Some(principal),
            deputy_to_branch_id: Some(branch.id),
        });
    }

    let superior = office.reports_to_id();
    let reports_to_branch_id = match branch.parent_id {
        None => branch.id,
        Some(parent_id) if !office.can_skip_report => parent_id,
        Some(parent_id) => {
            nearest_occupied_branch(branches, officers, superior, parent_id, max_depth).await?
        }
    };

    Ok(ReportingFields {
        reports_to_office_id: superior,
        reports_to_branch_id: Some(reports_to_branch_id),
        deputy_to_office_id: None,
        deputy_to_branch_id: None,
    })
}

/// Walk up from `start` to the first branch where `superior` has a Current
/// holder. Falls back to the last branch visited (the root).
async fn nearest_occupied_branch<B, O>(
    branches: &B,
    officers: &O,
    superior: Option<Uuid>,
    start: Uuid,
    max_depth: usize,
) -> KmpResult<Uuid>
where
    B: BranchRepository,
    O: OfficerRepository,
{
    let mut current = branches.get_by_id(start).await?;

    for _ in 0..max_depth {
        if let Some(office_id) = superior {
            if officers.count_current(office_id, current.id).await? > 0 {
                return Ok(current.id);
            }
        }

        match current.parent_id {
            Some(parent_id) => current = branches.get_by_id(parent_id).await?,
            None => {
                debug!(branch = %current.id, "No occupied ancestor, reporting to root");
                return Ok(current.id);
            }
        }
    }

    Err(OfficerError::HierarchyTooDeep(max_depth).into())
}
