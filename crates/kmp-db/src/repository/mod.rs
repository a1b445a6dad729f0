//! SurrealDB repository implementations.

mod branch;
mod department;
mod member;
mod member_role;
mod office;
mod officer;

pub use branch::SurrealBranchRepository;
pub use department::SurrealDepartmentRepository;
pub use member::SurrealMemberRepository;
pub use member_role::SurrealMemberRoleRepository;
pub use office::SurrealOfficeRepository;
pub use officer::SurrealOfficerRepository;

use chrono::{DateTime, Utc};
use kmp_core::error::KmpResult;
use kmp_core::models::window::WindowStatus;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

pub(crate) fn parse_opt_uuid(value: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(&v, field)).transpose()
}

pub(crate) fn parse_status(value: &str) -> Result<WindowStatus, DbError> {
    WindowStatus::parse(value).ok_or_else(|| DbError::Decode(format!("unknown status: {value}")))
}

pub(crate) fn opt_to_string(value: Option<Uuid>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Live windows whose expiry has passed.
pub(crate) const LAPSED_FILTER: &str = "expires_on != NONE AND expires_on <= $now \
     AND status IN ['Current', 'Upcoming']";

/// Upcoming windows whose start has arrived.
pub(crate) const STARTED_FILTER: &str = "start_on <= $now AND status = 'Upcoming'";

/// Count the rows of a windowed `table` matching `filter`, then set their
/// status. Shared by every table carrying `start_on`/`expires_on`/`status`.
pub(crate) async fn transition_windows<C: Connection>(
    db: &Surreal<C>,
    table: &str,
    filter: &str,
    status: WindowStatus,
    now: DateTime<Utc>,
) -> KmpResult<u64> {
    let mut count_result = db
        .query(format!(
            "SELECT count() AS total FROM {table} WHERE {filter} GROUP ALL"
        ))
        .bind(("now", now))
        .await
        .map_err(DbError::from)?;
    let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
    let total = count_rows.first().map(|r| r.total).unwrap_or(0);

    if total > 0 {
        db.query(format!(
            "UPDATE {table} SET status = $status, updated_at = time::now() WHERE {filter}"
        ))
        .bind(("status", status.as_str()))
        .bind(("now", now))
        .await
        .map_err(DbError::from)?
        .check()
        .map_err(|e| DbError::Query(e.to_string()))?;
    }

    Ok(total)
}
