//! SurrealDB implementation of [`OfficeRepository`].
//!
//! Offices are soft-deleted: a deleted office keeps its row (officers still
//! point at it) but disappears from every read.

use chrono::{DateTime, Utc};
use kmp_core::error::{KmpError, KmpResult};
use kmp_core::models::office::{CreateOffice, Office, OfficeHierarchy, UpdateOffice};
use kmp_core::repository::{OfficeRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, opt_to_string, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OfficeRow {
    record_id: String,
    name: String,
    department_id: String,
    requires_warrant: bool,
    required_office: bool,
    only_one_per_branch: bool,
    can_skip_report: bool,
    deputy_to_id: Option<String>,
    reports_to_id: Option<String>,
    grants_role_id: Option<String>,
    term_length: u32,
    applicable_branch_types: Vec<String>,
    default_contact_address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OfficeRow {
    fn try_into_office(self) -> Result<Office, DbError> {
        let hierarchy = OfficeHierarchy::from_parts(
            parse_opt_uuid(self.deputy_to_id, "deputy_to")?,
            parse_opt_uuid(self.reports_to_id, "reports_to")?,
        );
        Ok(Office {
            id: parse_uuid(&self.record_id, "office")?,
            name: self.name,
            department_id: parse_uuid(&self.department_id, "department")?,
            requires_warrant: self.requires_warrant,
            required_office: self.required_office,
            only_one_per_branch: self.only_one_per_branch,
            can_skip_report: self.can_skip_report,
            hierarchy,
            grants_role_id: parse_opt_uuid(self.grants_role_id, "role")?,
            term_length: self.term_length,
            applicable_branch_types: self.applicable_branch_types,
            default_contact_address: self.default_contact_address,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_LIVE_OFFICE: &str = "SELECT meta::id(id) AS record_id, * \
     FROM type::record('office', $id) WHERE deleted = NONE";

/// SurrealDB implementation of the Office repository.
#[derive(Clone)]
pub struct SurrealOfficeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOfficeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn require_department(&self, department_id: Uuid) -> KmpResult<()> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM type::record('department', $id) \
                 GROUP ALL",
            )
            .bind(("id", department_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;

        if rows.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(KmpError::validation(format!(
                "department {department_id} does not exist"
            )));
        }
        Ok(())
    }

    async fn require_superior(&self, hierarchy: &OfficeHierarchy) -> KmpResult<()> {
        let Some(target) = hierarchy.reports_to_id() else {
            return Ok(());
        };
        match self.get_by_id(target).await {
            Ok(_) => Ok(()),
            Err(KmpError::NotFound { .. }) => Err(KmpError::validation(format!(
                "office {target} referenced by the hierarchy does not exist"
            ))),
            Err(e) => Err(e),
        }
    }
}

fn validate_name(name: &str) -> KmpResult<()> {
    if name.trim().is_empty() {
        return Err(KmpError::validation("office name must not be empty"));
    }
    Ok(())
}

impl<C: Connection> OfficeRepository for SurrealOfficeRepository<C> {
    async fn create(&self, input: CreateOffice) -> KmpResult<Office> {
        validate_name(&input.name)?;
        self.require_department(input.department_id).await?;
        self.require_superior(&input.hierarchy).await?;

        let id_str = Uuid::new_v4().to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('office', $id) SET \
                 name = $name, \
                 department_id = $department_id, \
                 requires_warrant = $requires_warrant, \
                 required_office = $required_office, \
                 only_one_per_branch = $only_one_per_branch, \
                 can_skip_report = $can_skip_report, \
                 deputy_to_id = $deputy_to_id, \
                 reports_to_id = $reports_to_id, \
                 grants_role_id = $grants_role_id, \
                 term_length = $term_length, \
                 applicable_branch_types = $applicable_branch_types, \
                 default_contact_address = $default_contact_address; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('office', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("department_id", input.department_id.to_string()))
            .bind(("requires_warrant", input.requires_warrant))
            .bind(("required_office", input.required_office))
            .bind(("only_one_per_branch", input.only_one_per_branch))
            .bind(("can_skip_report", input.can_skip_report))
            .bind(("deputy_to_id", opt_to_string(input.hierarchy.deputy_to_id())))
            .bind(("reports_to_id", opt_to_string(input.hierarchy.reports_to_id())))
            .bind(("grants_role_id", opt_to_string(input.grants_role_id)))
            .bind(("term_length", input.term_length))
            .bind(("applicable_branch_types", input.applicable_branch_types))
            .bind(("default_contact_address", input.default_contact_address))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OfficeRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "office".into(),
            id: id_str,
        })?;

        Ok(row.try_into_office()?)
    }

    async fn get_by_id(&self, id: Uuid) -> KmpResult<Office> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_LIVE_OFFICE)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OfficeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "office".into(),
            id: id_str,
        })?;

        Ok(row.try_into_office()?)
    }

    async fn update(&self, id: Uuid, input: UpdateOffice) -> KmpResult<Office> {
        // Ensures the office exists and has not been deleted.
        self.get_by_id(id).await?;

        if let Some(name) = &input.name {
            validate_name(name)?;
        }
        if let Some(department_id) = input.department_id {
            self.require_department(department_id).await?;
        }
        if let Some(hierarchy) = &input.hierarchy {
            if hierarchy.references(id) {
                return Err(KmpError::validation(
                    "an office cannot report to or deputise for itself",
                ));
            }
            self.require_superior(hierarchy).await?;
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.department_id.is_some() {
            sets.push("department_id = $department_id");
        }
        if input.requires_warrant.is_some() {
            sets.push("requires_warrant = $requires_warrant");
        }
        if input.required_office.is_some() {
            sets.push("required_office = $required_office");
        }
        if input.only_one_per_branch.is_some() {
            sets.push("only_one_per_branch = $only_one_per_branch");
        }
        if input.can_skip_report.is_some() {
            sets.push("can_skip_report = $can_skip_report");
        }
        if input.hierarchy.is_some() {
            // Both links move together so they can never disagree.
            sets.push("deputy_to_id = $deputy_to_id");
            sets.push("reports_to_id = $reports_to_id");
        }
        if input.grants_role_id.is_some() {
            sets.push("grants_role_id = $grants_role_id");
        }
        if input.term_length.is_some() {
            sets.push("term_length = $term_length");
        }
        if input.applicable_branch_types.is_some() {
            sets.push("applicable_branch_types = $applicable_branch_types");
        }
        if input.default_contact_address.is_some() {
            sets.push("default_contact_address = $default_contact_address");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('office', $id) SET {} WHERE deleted = NONE; \
             {SELECT_LIVE_OFFICE};",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(department_id) = input.department_id {
            builder = builder.bind(("department_id", department_id.to_string()));
        }
        if let Some(requires_warrant) = input.requires_warrant {
            builder = builder.bind(("requires_warrant", requires_warrant));
        }
        if let Some(required_office) = input.required_office {
            builder = builder.bind(("required_office", required_office));
        }
        if let Some(only_one_per_branch) = input.only_one_per_branch {
            builder = builder.bind(("only_one_per_branch", only_one_per_branch));
        }
        if let Some(can_skip_report) = input.can_skip_report {
            builder = builder.bind(("can_skip_report", can_skip_report));
        }
        if let Some(hierarchy) = input.hierarchy {
            builder = builder
                .bind(("deputy_to_id", opt_to_string(hierarchy.deputy_to_id())))
                .bind(("reports_to_id", opt_to_string(hierarchy.reports_to_id())));
        }
        if let Some(grants_role_id) = input.grants_role_id {
            builder = builder.bind(("grants_role_id", opt_to_string(grants_role_id)));
        }
        if let Some(term_length) = input.term_length {
            builder = builder.bind(("term_length", term_length));
        }
        if let Some(applicable_branch_types) = input.applicable_branch_types {
            builder = builder.bind(("applicable_branch_types", applicable_branch_types));
        }
        if let Some(default_contact_address) = input.default_contact_address {
            builder = builder.bind(("default_contact_address", default_contact_address));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OfficeRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "office".into(),
            id: id_str,
        })?;

        Ok(row.try_into_office()?)
    }

    async fn delete(&self, id: Uuid) -> KmpResult<()> {
        self.db
            .query(
                "UPDATE type::record('office', $id) \
                 SET deleted = time::now(), updated_at = time::now() \
                 WHERE deleted = NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> KmpResult<PaginatedResult<Office>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM office WHERE deleted = NONE GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM office \
                 WHERE deleted = NONE \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OfficeRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_office())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
