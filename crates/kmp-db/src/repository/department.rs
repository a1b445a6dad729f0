//! SurrealDB implementation of [`DepartmentRepository`].

use chrono::{DateTime, Utc};
use kmp_core::error::KmpResult;
use kmp_core::models::department::{CreateDepartment, Department};
use kmp_core::repository::DepartmentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct DepartmentRow {
    record_id: String,
    name: String,
    domain: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DepartmentRow {
    fn try_into_department(self) -> Result<Department, DbError> {
        Ok(Department {
            id: parse_uuid(&self.record_id, "department")?,
            name: self.name,
            domain: self.domain,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Department repository.
#[derive(Clone)]
pub struct SurrealDepartmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDepartmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DepartmentRepository for SurrealDepartmentRepository<C> {
    async fn create(&self, input: CreateDepartment) -> KmpResult<Department> {
        let id_str = Uuid::new_v4().to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('department', $id) SET \
                 name = $name, domain = $domain; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('department', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("domain", input.domain))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DepartmentRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "department".into(),
            id: id_str,
        })?;

        Ok(row.try_into_department()?)
    }

    async fn get_by_id(&self, id: Uuid) -> KmpResult<Department> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('department', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "department".into(),
            id: id_str,
        })?;

        Ok(row.try_into_department()?)
    }

    async fn list(&self) -> KmpResult<Vec<Department>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM department ORDER BY name ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DepartmentRow> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_department())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
