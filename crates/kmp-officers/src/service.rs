//! Officer service: assignment, release, recalculation and the reporting
//! queries built on top of them.

use chrono::{DateTime, Utc};
use kmp_core::error::{KmpError, KmpResult};
use kmp_core::models::member_role::MEMBER_ROLE_ENTITY;
use kmp_core::models::office::Office;
use kmp_core::models::officer::{CreateOfficer, OFFICER_ENTITY, Officer};
use kmp_core::models::window::{WindowStatus, expiry_for_term};
use kmp_core::repository::{
    ActiveWindowManager, BranchRepository, MemberRepository, MemberRoleRepository,
    OfficeRepository, OfficerRepository, StartWindow, StopWindow,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::OfficerConfig;
use crate::display;
use crate::error::OfficerError;
use crate::hierarchy;
use crate::reporting::calculate_reporting_fields;

/// Input for assigning a member to an office.
#[derive(Debug, Clone)]
pub struct AssignOfficer {
    pub office_id: Uuid,
    pub member_id: Uuid,
    pub branch_id: Uuid,
    pub start_on: DateTime<Utc>,
    /// Defaults to `start_on` plus the office's term.
    pub end_on: Option<DateTime<Utc>>,
    pub deputy_description: Option<String>,
    pub approver_id: Uuid,
    /// Office contact address shown in listings.
    pub email_address: Option<String>,
}

/// Input for ending an assignment early.
#[derive(Debug, Clone)]
pub struct ReleaseOfficer {
    pub officer_id: Uuid,
    pub revoker_id: Uuid,
    pub revoked_on: DateTime<Utc>,
    pub reason: String,
    /// Defaults to [`WindowStatus::Released`].
    pub status: Option<WindowStatus>,
}

/// Outcome of [`OfficerService::recalculate_officers_for_office`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecalculateSummary {
    pub current_count: usize,
    pub upcoming_count: usize,
    /// Officers whose reporting snapshot changed.
    pub updated_count: usize,
}

/// Outcome of [`OfficerService::sync_statuses`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncSummary {
    pub expired: u64,
    pub activated: u64,
    /// Granted member roles moved alongside their officers.
    pub roles_expired: u64,
    pub roles_activated: u64,
}

/// Officer service.
///
/// Generic over repository implementations so that the officer layer has
/// no dependency on the database crate. None of the operations open a
/// transaction: callers that need `assign` to be atomic with the window
/// start (and with the occupancy counts it reads) must wrap the call in one.
pub struct OfficerService<F, B, O, M, R, W>
where
    F: OfficeRepository,
    B: BranchRepository,
    O: OfficerRepository,
    M: MemberRepository,
    R: MemberRoleRepository,
    W: ActiveWindowManager,
{
    offices: F,
    branches: B,
    officers: O,
    members: M,
    member_roles: R,
    windows: W,
    config: OfficerConfig,
}

/// Report a missing reference as a validation failure of the request.
fn reference<T>(result: KmpResult<T>) -> KmpResult<T> {
    match result {
        Err(KmpError::NotFound { entity, id }) => Err(KmpError::validation(format!(
            "{entity} {id} does not exist"
        ))),
        other => other,
    }
}

impl<F, B, O, M, R, W> OfficerService<F, B, O, M, R, W>
where
    F: OfficeRepository,
    B: BranchRepository,
    O: OfficerRepository,
    M: MemberRepository,
    R: MemberRoleRepository,
    W: ActiveWindowManager,
{
    pub fn new(
        offices: F,
        branches: B,
        officers: O,
        members: M,
        member_roles: R,
        windows: W,
        config: OfficerConfig,
    ) -> Self {
        Self {
            offices,
            branches,
            officers,
            members,
            member_roles,
            windows,
            config,
        }
    }

    pub fn config(&self) -> &OfficerConfig {
        &self.config
    }

    /// Assign a member to an office in a branch.
    ///
    /// Records the reporting snapshot, then opens the assignment's active
    /// window, which displaces the current holder of an
    /// `only_one_per_branch` office and grants the office's role.
    pub async fn assign(&self, input: AssignOfficer) -> KmpResult<Officer> {
        let office = reference(self.offices.get_by_id(input.office_id).await)?;
        let member = reference(self.members.get_by_id(input.member_id).await)?;
        let branch = reference(self.branches.get_by_id(input.branch_id).await)?;

        if office.requires_warrant && !member.warrantable {
            return Err(OfficerError::MemberNotWarrantable {
                member_id: member.id,
            }
            .into());
        }
        if !office.applies_to(&branch.branch_type) {
            return Err(OfficerError::BranchTypeNotApplicable {
                office: office.name.clone(),
                branch_type: branch.branch_type.clone(),
            }
            .into());
        }

        let expires_on = input
            .end_on
            .or_else(|| expiry_for_term(input.start_on, office.term_length));
        if matches!(expires_on, Some(end) if end < input.start_on) {
            return Err(OfficerError::InvalidWindow.into());
        }
        let status = WindowStatus::for_window(input.start_on, expires_on, Utc::now());

        let reporting = calculate_reporting_fields(
            &self.branches,
            &self.officers,
            &office,
            &branch,
            self.config.max_hierarchy_depth,
        )
        .await?;

        let officer = self
            .officers
            .create(CreateOfficer {
                member_id: member.id,
                branch_id: branch.id,
                office_id: office.id,
                status,
                start_on: input.start_on,
                expires_on,
                reporting,
                deputy_description: input.deputy_description,
                email_address: input.email_address.unwrap_or_default(),
                approver_id: input.approver_id,
            })
            .await?;

        self.windows
            .start(StartWindow {
                entity_type: OFFICER_ENTITY.into(),
                entity_id: officer.id,
                approver_id: input.approver_id,
                start_on: input.start_on,
                expires_on,
                term_length_months: office.term_length,
                grants_role_id: office.grants_role_id,
                close_existing: office.only_one_per_branch,
                replaced_reason: self.config.replaced_reason.clone(),
                branch_id: Some(branch.id),
            })
            .await?;

        let officer = self.officers.get_by_id(officer.id).await?;

        info!(
            officer = %officer.id,
            member = %member.sca_name,
            office = %office.name,
            branch = %branch.name,
            start_on = %officer.start_on,
            expires_on = ?officer.expires_on,
            status = %officer.status,
            requires_warrant = office.requires_warrant,
            "Officer hired"
        );

        Ok(officer)
    }

    /// End an assignment before its term runs out.
    pub async fn release(&self, input: ReleaseOfficer) -> KmpResult<Officer> {
        let officer = self.officers.get_by_id(input.officer_id).await?;
        let status = input.status.unwrap_or(WindowStatus::Released);

        self.windows
            .stop(StopWindow {
                entity_type: OFFICER_ENTITY.into(),
                entity_id: officer.id,
                revoker_id: input.revoker_id,
                status,
                reason: input.reason,
                expires_on: input.revoked_on,
            })
            .await?;

        let officer = self.officers.get_by_id(officer.id).await?;
        info!(
            officer = %officer.id,
            office = %officer.office_id,
            branch = %officer.branch_id,
            status = %officer.status,
            "Officer released"
        );

        Ok(officer)
    }

    /// Recompute the reporting snapshot of every Current and Upcoming
    /// officer of an office, typically after its hierarchy changed.
    ///
    /// Roles granted under a role the office no longer grants are ended.
    pub async fn recalculate_officers_for_office(
        &self,
        office_id: Uuid,
        updater_id: Uuid,
    ) -> KmpResult<RecalculateSummary> {
        let office = self.offices.get_by_id(office_id).await?;
        let current = self
            .officers
            .list_by_office(office_id, WindowStatus::Current)
            .await?;
        let upcoming = self
            .officers
            .list_by_office(office_id, WindowStatus::Upcoming)
            .await?;

        let mut summary = RecalculateSummary {
            current_count: current.len(),
            upcoming_count: upcoming.len(),
            updated_count: 0,
        };

        for officer in current.iter().chain(&upcoming) {
            let branch = self.branches.get_by_id(officer.branch_id).await?;
            let reporting = calculate_reporting_fields(
                &self.branches,
                &self.officers,
                &office,
                &branch,
                self.config.max_hierarchy_depth,
            )
            .await?;

            if reporting != officer.reporting() {
                self.officers.update_reporting(officer.id, reporting).await?;
                summary.updated_count += 1;
            }

            self.end_stale_role(&office, officer, updater_id)
                .await
                .map_err(|e| KmpError::LifecycleFailed {
                    reason: format!(
                        "Failed to end role for officer {} ({} at {}): {e}",
                        officer.id, office.name, branch.name
                    ),
                })?;
        }

        info!(
            office = %office.name,
            current = summary.current_count,
            upcoming = summary.upcoming_count,
            updated = summary.updated_count,
            "Recalculated officers for office"
        );

        Ok(summary)
    }

    async fn end_stale_role(
        &self,
        office: &Office,
        officer: &Officer,
        updater_id: Uuid,
    ) -> KmpResult<()> {
        let Some(member_role_id) = officer.granted_member_role_id else {
            return Ok(());
        };
        let role = self.member_roles.get_by_id(member_role_id).await?;
        if !role.status.is_live() || office.grants_role_id == Some(role.role_id) {
            return Ok(());
        }

        debug!(officer = %officer.id, member_role = %member_role_id, "Ending stale role");
        self.windows
            .stop(StopWindow {
                entity_type: MEMBER_ROLE_ENTITY.into(),
                entity_id: member_role_id,
                revoker_id: updater_id,
                status: WindowStatus::Released,
                reason: "Office no longer grants this role".into(),
                expires_on: Utc::now(),
            })
            .await
    }

    /// Bring stored statuses in line with the calendar: lapsed assignments
    /// and role grants expire, then those whose start has arrived become
    /// current.
    pub async fn sync_statuses(&self, now: DateTime<Utc>) -> KmpResult<SyncSummary> {
        let expired = self.officers.expire_lapsed(now).await?;
        let roles_expired = self.member_roles.expire_lapsed(now).await?;
        let activated = self.officers.activate_started(now).await?;
        let roles_activated = self.member_roles.activate_started(now).await?;

        info!(
            expired,
            activated,
            roles_expired,
            roles_activated,
            "Officer statuses synchronised"
        );
        Ok(SyncSummary {
            expired,
            activated,
            roles_expired,
            roles_activated,
        })
    }

    pub async fn effective_reports_to(&self, officer: &Officer) -> KmpResult<Vec<Officer>> {
        hierarchy::resolve_effective_reports_to(&self.officers, officer).await
    }

    pub async fn effective_deputy_to(&self, officer: &Officer) -> KmpResult<Vec<Officer>> {
        hierarchy::resolve_effective_deputy_to(&self.officers, officer).await
    }

    /// Nearest filled office above `officer`, climbing past vacancies.
    pub async fn escalated_reports_to(&self, officer: &Officer) -> KmpResult<Vec<Officer>> {
        hierarchy::find_escalated_reports_to(
            &self.officers,
            &self.offices,
            &self.branches,
            officer,
            self.config.max_hierarchy_depth,
        )
        .await
    }

    pub async fn format_reports_to(&self, officer: &Officer) -> KmpResult<String> {
        display::format_reports_to(&self.officers, &self.members, officer, &self.config).await
    }
}
