//! Live "who does this officer report to" resolution.
//!
//! Every call re-queries the slot named by the officer's snapshot, so the
//! answer follows whoever holds that office today. Nothing is cached.

use std::collections::HashSet;

use kmp_core::error::{KmpError, KmpResult};
use kmp_core::models::officer::Officer;
use kmp_core::repository::{BranchRepository, OfficeRepository, OfficerRepository};
use tracing::debug;
use uuid::Uuid;

async fn holders<O: OfficerRepository>(
    officers: &O,
    office_id: Option<Uuid>,
    branch_id: Option<Uuid>,
) -> KmpResult<Vec<Officer>> {
    match (office_id, branch_id) {
        (Some(office_id), Some(branch_id)) => officers.find_current(office_id, branch_id).await,
        _ => Ok(Vec::new()),
    }
}

/// Current holders of the slot `officer` reports to.
///
/// Empty when the snapshot names no slot (the officer reports to the
/// Society) or when the slot is vacant.
pub async fn resolve_effective_reports_to<O: OfficerRepository>(
    officers: &O,
    officer: &Officer,
) -> KmpResult<Vec<Officer>> {
    holders(
        officers,
        officer.reports_to_office_id,
        officer.reports_to_branch_id,
    )
    .await
}

/// Current holders of the slot `officer` is a deputy to.
pub async fn resolve_effective_deputy_to<O: OfficerRepository>(
    officers: &O,
    officer: &Officer,
) -> KmpResult<Vec<Officer>> {
    holders(
        officers,
        officer.deputy_to_office_id,
        officer.deputy_to_branch_id,
    )
    .await
}

/// Like [`resolve_effective_reports_to`], but a vacant slot escalates to the
/// vacant office's superior one branch up, until a holder is found or either
/// hierarchy runs out.
pub async fn find_escalated_reports_to<O, F, B>(
    officers: &O,
    offices: &F,
    branches: &B,
    officer: &Officer,
    max_depth: usize,
) -> KmpResult<Vec<Officer>>
where
    O: OfficerRepository,
    F: OfficeRepository,
    B: BranchRepository,
{
    let (Some(mut office_id), Some(mut branch_id)) =
        (officer.reports_to_office_id, officer.reports_to_branch_id)
    else {
        return Ok(Vec::new());
    };

    let mut visited = HashSet::new();
    while visited.len() < max_depth && visited.insert((office_id, branch_id)) {
        let found = officers.find_current(office_id, branch_id).await?;
        if !found.is_empty() {
            return Ok(found);
        }

        // A deleted office ends the climb like a missing superior does.
        let office = match offices.get_by_id(office_id).await {
            Ok(office) => office,
            Err(KmpError::NotFound { .. }) => break,
            Err(e) => return Err(e),
        };
        let Some(superior) = office.reports_to_id() else {
            break;
        };
        let Some(parent_id) = branches.get_by_id(branch_id).await?.parent_id else {
            break;
        };

        debug!(
            vacant_office = %office_id,
            vacant_branch = %branch_id,
            next_office = %superior,
            next_branch = %parent_id,
            "Escalating past vacant office"
        );
        office_id = superior;
        branch_id = parent_id;
    }

    Ok(Vec::new())
}
