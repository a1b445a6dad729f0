//! SurrealDB implementation of [`BranchRepository`].

use chrono::{DateTime, Utc};
use kmp_core::error::{KmpError, KmpResult};
use kmp_core::models::branch::{Branch, CreateBranch, MAX_HIERARCHY_DEPTH, UpdateBranch};
use kmp_core::repository::{BranchRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct BranchRow {
    record_id: String,
    name: String,
    parent_id: Option<String>,
    branch_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BranchRow {
    fn try_into_branch(self) -> Result<Branch, DbError> {
        Ok(Branch {
            id: parse_uuid(&self.record_id, "branch")?,
            name: self.name,
            parent_id: parse_opt_uuid(self.parent_id, "parent")?,
            branch_type: self.branch_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Branch repository.
#[derive(Clone)]
pub struct SurrealBranchRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBranchRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn require_parent(&self, parent_id: Uuid) -> KmpResult<()> {
        match self.get_by_id(parent_id).await {
            Ok(_) => Ok(()),
            Err(KmpError::NotFound { .. }) => Err(KmpError::validation(format!(
                "parent branch {parent_id} does not exist"
            ))),
            Err(e) => Err(e),
        }
    }
}

impl<C: Connection> BranchRepository for SurrealBranchRepository<C> {
    async fn create(&self, input: CreateBranch) -> KmpResult<Branch> {
        if let Some(parent_id) = input.parent_id {
            self.require_parent(parent_id).await?;
        }

        let id_str = Uuid::new_v4().to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('branch', $id) SET \
                 name = $name, parent_id = $parent_id, \
                 branch_type = $branch_type; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('branch', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .bind(("branch_type", input.branch_type))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<BranchRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "branch".into(),
            id: id_str,
        })?;

        Ok(row.try_into_branch()?)
    }

    async fn get_by_id(&self, id: Uuid) -> KmpResult<Branch> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('branch', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BranchRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "branch".into(),
            id: id_str,
        })?;

        Ok(row.try_into_branch()?)
    }

    async fn update(&self, id: Uuid, input: UpdateBranch) -> KmpResult<Branch> {
        if let Some(Some(new_parent)) = input.parent_id {
            if new_parent == id {
                return Err(KmpError::validation("a branch cannot be its own parent"));
            }
            self.require_parent(new_parent).await?;
            let ancestors = self.get_ancestors(new_parent).await?;
            if ancestors.iter().any(|a| a.id == id) {
                return Err(KmpError::validation(format!(
                    "branch {new_parent} is a descendant of {id}"
                )));
            }
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.branch_type.is_some() {
            sets.push("branch_type = $branch_type");
        }
        if input.parent_id.is_some() {
            sets.push("parent_id = $parent_id");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('branch', $id) SET {}; \
             SELECT meta::id(id) AS record_id, * FROM type::record('branch', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(branch_type) = input.branch_type {
            builder = builder.bind(("branch_type", branch_type));
        }
        if let Some(parent_id) = input.parent_id {
            builder = builder.bind(("parent_id", parent_id.map(|p| p.to_string())));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<BranchRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "branch".into(),
            id: id_str,
        })?;

        Ok(row.try_into_branch()?)
    }

    async fn list(&self, pagination: Pagination) -> KmpResult<PaginatedResult<Branch>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM branch GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM branch \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BranchRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_branch())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_children(&self, parent_id: Uuid) -> KmpResult<Vec<Branch>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM branch \
                 WHERE parent_id = $parent_id ORDER BY name ASC",
            )
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BranchRow> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_branch())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn get_ancestors(&self, id: Uuid) -> KmpResult<Vec<Branch>> {
        let mut ancestors = Vec::new();
        let mut next = self.get_by_id(id).await?.parent_id;

        for _ in 0..MAX_HIERARCHY_DEPTH {
            let Some(parent_id) = next else {
                break;
            };
            let parent = self.get_by_id(parent_id).await?;
            next = parent.parent_id;
            ancestors.push(parent);
        }

        Ok(ancestors)
    }
}
