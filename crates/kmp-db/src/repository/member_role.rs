//! SurrealDB implementation of [`MemberRoleRepository`].
//!
//! Grants are written by [`crate::SurrealActiveWindowManager`]; this
//! repository reads them and moves their status along the calendar.

use chrono::{DateTime, Utc};
use kmp_core::error::KmpResult;
use kmp_core::models::member_role::MemberRole;
use kmp_core::models::window::WindowStatus;
use kmp_core::repository::MemberRoleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{
    LAPSED_FILTER, STARTED_FILTER, parse_opt_uuid, parse_status, parse_uuid, transition_windows,
};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MemberRoleRow {
    record_id: String,
    member_id: String,
    role_id: String,
    branch_id: Option<String>,
    entity_type: String,
    entity_id: String,
    approver_id: String,
    start_on: DateTime<Utc>,
    expires_on: Option<DateTime<Utc>>,
    revoker_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl MemberRoleRow {
    fn try_into_member_role(self) -> Result<MemberRole, DbError> {
        Ok(MemberRole {
            id: parse_uuid(&self.record_id, "member_role")?,
            member_id: parse_uuid(&self.member_id, "member")?,
            role_id: parse_uuid(&self.role_id, "role")?,
            branch_id: parse_opt_uuid(self.branch_id, "branch")?,
            entity_type: self.entity_type,
            entity_id: parse_uuid(&self.entity_id, "entity")?,
            approver_id: parse_uuid(&self.approver_id, "approver")?,
            start_on: self.start_on,
            expires_on: self.expires_on,
            revoker_id: parse_opt_uuid(self.revoker_id, "revoker")?,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the MemberRole repository.
#[derive(Clone)]
pub struct SurrealMemberRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMemberRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MemberRoleRepository for SurrealMemberRoleRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> KmpResult<MemberRole> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('member_role', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member_role".into(),
            id: id_str,
        })?;

        Ok(row.try_into_member_role()?)
    }

    async fn list_by_member(&self, member_id: Uuid) -> KmpResult<Vec<MemberRole>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM member_role \
                 WHERE member_id = $member_id ORDER BY start_on ASC",
            )
            .bind(("member_id", member_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRoleRow> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_member_role())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> KmpResult<u64> {
        transition_windows(&self.db, "member_role", LAPSED_FILTER, WindowStatus::Expired, now)
            .await
    }

    async fn activate_started(&self, now: DateTime<Utc>) -> KmpResult<u64> {
        transition_windows(&self.db, "member_role", STARTED_FILTER, WindowStatus::Current, now)
            .await
    }
}
