//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Services receive repositories by
//! injection and never reach for a global table registry.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::KmpResult;
use crate::models::{
    branch::{Branch, CreateBranch, UpdateBranch},
    department::{CreateDepartment, Department},
    member::{CreateMember, Member, UpdateMember},
    member_role::MemberRole,
    office::{CreateOffice, Office, UpdateOffice},
    officer::{CreateOfficer, Officer, ReportingFields},
    window::WindowStatus,
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Office hierarchy store
// ---------------------------------------------------------------------------

pub trait DepartmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateDepartment,
    ) -> impl Future<Output = KmpResult<Department>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = KmpResult<Department>> + Send;
    fn list(&self) -> impl Future<Output = KmpResult<Vec<Department>>> + Send;
}

pub trait OfficeRepository: Send + Sync {
    /// Validates that the department exists and the name is unused.
    fn create(&self, input: CreateOffice) -> impl Future<Output = KmpResult<Office>> + Send;
    /// Soft-deleted offices are reported as not found.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = KmpResult<Office>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOffice,
    ) -> impl Future<Output = KmpResult<Office>> + Send;
    /// Soft-delete: stamps `deleted`, keeping the row for existing officers.
    fn delete(&self, id: Uuid) -> impl Future<Output = KmpResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = KmpResult<PaginatedResult<Office>>> + Send;
}

// ---------------------------------------------------------------------------
// Branch tree
// ---------------------------------------------------------------------------

pub trait BranchRepository: Send + Sync {
    /// The parent, when given, must already exist.
    fn create(&self, input: CreateBranch) -> impl Future<Output = KmpResult<Branch>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = KmpResult<Branch>> + Send;
    /// Rejects a re-parent that would introduce a cycle.
    fn update(
        &self,
        id: Uuid,
        input: UpdateBranch,
    ) -> impl Future<Output = KmpResult<Branch>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = KmpResult<PaginatedResult<Branch>>> + Send;

    /// Get direct children of a branch.
    fn get_children(&self, parent_id: Uuid) -> impl Future<Output = KmpResult<Vec<Branch>>> + Send;

    /// Get all ancestors of a branch, nearest first.
    fn get_ancestors(&self, id: Uuid) -> impl Future<Output = KmpResult<Vec<Branch>>> + Send;
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

pub trait MemberRepository: Send + Sync {
    fn create(&self, input: CreateMember) -> impl Future<Output = KmpResult<Member>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = KmpResult<Member>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateMember,
    ) -> impl Future<Output = KmpResult<Member>> + Send;
}

pub trait MemberRoleRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = KmpResult<MemberRole>> + Send;
    fn list_by_member(
        &self,
        member_id: Uuid,
    ) -> impl Future<Output = KmpResult<Vec<MemberRole>>> + Send;

    /// Expire live grants whose expiry is at or before `now`.
    fn expire_lapsed(&self, now: DateTime<Utc>) -> impl Future<Output = KmpResult<u64>> + Send;

    /// Make upcoming grants whose start has arrived current.
    fn activate_started(&self, now: DateTime<Utc>)
    -> impl Future<Output = KmpResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Officer assignment store
// ---------------------------------------------------------------------------

pub trait OfficerRepository: Send + Sync {
    fn create(&self, input: CreateOfficer) -> impl Future<Output = KmpResult<Officer>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = KmpResult<Officer>> + Send;

    /// All `Current` officers holding `office_id` in `branch_id`.
    fn find_current(
        &self,
        office_id: Uuid,
        branch_id: Uuid,
    ) -> impl Future<Output = KmpResult<Vec<Officer>>> + Send;

    /// Number of `Current` officers holding `office_id` in `branch_id`.
    fn count_current(
        &self,
        office_id: Uuid,
        branch_id: Uuid,
    ) -> impl Future<Output = KmpResult<u64>> + Send;

    fn list_by_office(
        &self,
        office_id: Uuid,
        status: WindowStatus,
    ) -> impl Future<Output = KmpResult<Vec<Officer>>> + Send;

    /// Overwrite the reporting snapshot of an existing officer.
    fn update_reporting(
        &self,
        id: Uuid,
        reporting: ReportingFields,
    ) -> impl Future<Output = KmpResult<Officer>> + Send;

    /// Mark live officers whose expiry is at or before `now` as expired.
    /// Returns the number of officers changed.
    fn expire_lapsed(&self, now: DateTime<Utc>) -> impl Future<Output = KmpResult<u64>> + Send;

    /// Mark upcoming officers whose start is at or before `now` as current.
    /// Returns the number of officers changed.
    fn activate_started(&self, now: DateTime<Utc>)
    -> impl Future<Output = KmpResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Active-window lifecycle
// ---------------------------------------------------------------------------

/// Request to open the active window of a time-boxed record.
#[derive(Debug, Clone)]
pub struct StartWindow {
    /// Entity tag identifying the record's table (e.g. `officer`).
    pub entity_type: String,
    pub entity_id: Uuid,
    pub approver_id: Uuid,
    pub start_on: DateTime<Utc>,
    /// Derived from `term_length_months` when absent.
    pub expires_on: Option<DateTime<Utc>>,
    pub term_length_months: u32,
    /// Role granted to the record's member for the window, if any.
    pub grants_role_id: Option<Uuid>,
    /// Replace any other live record occupying the same slot.
    pub close_existing: bool,
    /// Reason stamped on records displaced by `close_existing`.
    pub replaced_reason: String,
    pub branch_id: Option<Uuid>,
}

/// Request to close the active window of a time-boxed record.
#[derive(Debug, Clone)]
pub struct StopWindow {
    pub entity_type: String,
    pub entity_id: Uuid,
    pub revoker_id: Uuid,
    /// Terminal status recorded on the record (the reason code).
    pub status: WindowStatus,
    pub reason: String,
    pub expires_on: DateTime<Utc>,
}

/// Starts and stops active windows, granting and revoking the roles they
/// carry. Failures are surfaced to callers unchanged.
pub trait ActiveWindowManager: Send + Sync {
    fn start(&self, input: StartWindow) -> impl Future<Output = KmpResult<()>> + Send;
    fn stop(&self, input: StopWindow) -> impl Future<Output = KmpResult<()>> + Send;
}
