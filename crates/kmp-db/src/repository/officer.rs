//! SurrealDB implementation of [`OfficerRepository`].

use chrono::{DateTime, Utc};
use kmp_core::error::KmpResult;
use kmp_core::models::officer::{CreateOfficer, Officer, ReportingFields};
use kmp_core::models::window::WindowStatus;
use kmp_core::repository::OfficerRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{
    CountRow, LAPSED_FILTER, STARTED_FILTER, opt_to_string, parse_opt_uuid, parse_status,
    parse_uuid, transition_windows,
};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OfficerRow {
    record_id: String,
    member_id: String,
    branch_id: String,
    office_id: String,
    status: String,
    start_on: DateTime<Utc>,
    expires_on: Option<DateTime<Utc>>,
    reports_to_office_id: Option<String>,
    reports_to_branch_id: Option<String>,
    deputy_to_office_id: Option<String>,
    deputy_to_branch_id: Option<String>,
    deputy_description: Option<String>,
    email_address: String,
    approver_id: String,
    approval_date: DateTime<Utc>,
    revoker_id: Option<String>,
    revoked_reason: Option<String>,
    granted_member_role_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OfficerRow {
    fn try_into_officer(self) -> Result<Officer, DbError> {
        Ok(Officer {
            id: parse_uuid(&self.record_id, "officer")?,
            member_id: parse_uuid(&self.member_id, "member")?,
            branch_id: parse_uuid(&self.branch_id, "branch")?,
            office_id: parse_uuid(&self.office_id, "office")?,
            status: parse_status(&self.status)?,
            start_on: self.start_on,
            expires_on: self.expires_on,
            reports_to_office_id: parse_opt_uuid(self.reports_to_office_id, "reports_to_office")?,
            reports_to_branch_id: parse_opt_uuid(self.reports_to_branch_id, "reports_to_branch")?,
            deputy_to_office_id: parse_opt_uuid(self.deputy_to_office_id, "deputy_to_office")?,
            deputy_to_branch_id: parse_opt_uuid(self.deputy_to_branch_id, "deputy_to_branch")?,
            deputy_description: self.deputy_description,
            email_address: self.email_address,
            approver_id: parse_uuid(&self.approver_id, "approver")?,
            approval_date: self.approval_date,
            revoker_id: parse_opt_uuid(self.revoker_id, "revoker")?,
            revoked_reason: self.revoked_reason,
            granted_member_role_id: parse_opt_uuid(self.granted_member_role_id, "member_role")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_officers(rows: Vec<OfficerRow>) -> Result<Vec<Officer>, DbError> {
    rows.into_iter().map(|row| row.try_into_officer()).collect()
}

/// SurrealDB implementation of the Officer repository.
#[derive(Clone)]
pub struct SurrealOfficerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOfficerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OfficerRepository for SurrealOfficerRepository<C> {
    async fn create(&self, input: CreateOfficer) -> KmpResult<Officer> {
        let id_str = Uuid::new_v4().to_string();
        let reporting = input.reporting;

        let mut result = self
            .db
            .query(
                "CREATE type::record('officer', $id) SET \
                 member_id = $member_id, \
                 branch_id = $branch_id, \
                 office_id = $office_id, \
                 status = $status, \
                 start_on = $start_on, \
                 expires_on = $expires_on, \
                 reports_to_office_id = $reports_to_office_id, \
                 reports_to_branch_id = $reports_to_branch_id, \
                 deputy_to_office_id = $deputy_to_office_id, \
                 deputy_to_branch_id = $deputy_to_branch_id, \
                 deputy_description = $deputy_description, \
                 email_address = $email_address, \
                 approver_id = $approver_id; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('officer', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("member_id", input.member_id.to_string()))
            .bind(("branch_id", input.branch_id.to_string()))
            .bind(("office_id", input.office_id.to_string()))
            .bind(("status", input.status.as_str()))
            .bind(("start_on", input.start_on))
            .bind(("expires_on", input.expires_on))
            .bind((
                "reports_to_office_id",
                opt_to_string(reporting.reports_to_office_id),
            ))
            .bind((
                "reports_to_branch_id",
                opt_to_string(reporting.reports_to_branch_id),
            ))
            .bind((
                "deputy_to_office_id",
                opt_to_string(reporting.deputy_to_office_id),
            ))
            .bind((
                "deputy_to_branch_id",
                opt_to_string(reporting.deputy_to_branch_id),
            ))
            .bind(("deputy_description", input.deputy_description))
            .bind(("email_address", input.email_address))
            .bind(("approver_id", input.approver_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OfficerRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "officer".into(),
            id: id_str,
        })?;

        Ok(row.try_into_officer()?)
    }

    async fn get_by_id(&self, id: Uuid) -> KmpResult<Officer> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('officer', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OfficerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "officer".into(),
            id: id_str,
        })?;

        Ok(row.try_into_officer()?)
    }

    async fn find_current(&self, office_id: Uuid, branch_id: Uuid) -> KmpResult<Vec<Officer>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM officer \
                 WHERE office_id = $office_id AND branch_id = $branch_id \
                 AND status = 'Current' \
                 ORDER BY start_on ASC",
            )
            .bind(("office_id", office_id.to_string()))
            .bind(("branch_id", branch_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OfficerRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_officers(rows)?)
    }

    async fn count_current(&self, office_id: Uuid, branch_id: Uuid) -> KmpResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM officer \
                 WHERE office_id = $office_id AND branch_id = $branch_id \
                 AND status = 'Current' GROUP ALL",
            )
            .bind(("office_id", office_id.to_string()))
            .bind(("branch_id", branch_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn list_by_office(
        &self,
        office_id: Uuid,
        status: WindowStatus,
    ) -> KmpResult<Vec<Officer>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM officer \
                 WHERE office_id = $office_id AND status = $status \
                 ORDER BY start_on ASC",
            )
            .bind(("office_id", office_id.to_string()))
            .bind(("status", status.as_str()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OfficerRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_officers(rows)?)
    }

    async fn update_reporting(&self, id: Uuid, reporting: ReportingFields) -> KmpResult<Officer> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('officer', $id) SET \
                 reports_to_office_id = $reports_to_office_id, \
                 reports_to_branch_id = $reports_to_branch_id, \
                 deputy_to_office_id = $deputy_to_office_id, \
                 deputy_to_branch_id = $deputy_to_branch_id, \
                 updated_at = time::now(); \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('officer', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind((
                "reports_to_office_id",
                opt_to_string(reporting.reports_to_office_id),
            ))
            .bind((
                "reports_to_branch_id",
                opt_to_string(reporting.reports_to_branch_id),
            ))
            .bind((
                "deputy_to_office_id",
                opt_to_string(reporting.deputy_to_office_id),
            ))
            .bind((
                "deputy_to_branch_id",
                opt_to_string(reporting.deputy_to_branch_id),
            ))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OfficerRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "officer".into(),
            id: id_str,
        })?;

        Ok(row.try_into_officer()?)
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> KmpResult<u64> {
        transition_windows(&self.db, "officer", LAPSED_FILTER, WindowStatus::Expired, now).await
    }

    async fn activate_started(&self, now: DateTime<Utc>) -> KmpResult<u64> {
        transition_windows(&self.db, "officer", STARTED_FILTER, WindowStatus::Current, now).await
    }
}
