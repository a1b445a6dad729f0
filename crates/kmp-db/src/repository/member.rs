//! SurrealDB implementation of [`MemberRepository`].

use chrono::{DateTime, Utc};
use kmp_core::error::KmpResult;
use kmp_core::models::member::{CreateMember, Member, UpdateMember};
use kmp_core::repository::MemberRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MemberRow {
    record_id: String,
    sca_name: String,
    email_address: String,
    warrantable: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRow {
    fn try_into_member(self) -> Result<Member, DbError> {
        Ok(Member {
            id: parse_uuid(&self.record_id, "member")?,
            sca_name: self.sca_name,
            email_address: self.email_address,
            warrantable: self.warrantable,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Member repository.
#[derive(Clone)]
pub struct SurrealMemberRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMemberRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MemberRepository for SurrealMemberRepository<C> {
    async fn create(&self, input: CreateMember) -> KmpResult<Member> {
        let id_str = Uuid::new_v4().to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('member', $id) SET \
                 sca_name = $sca_name, \
                 email_address = $email_address, \
                 warrantable = $warrantable; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('member', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("sca_name", input.sca_name))
            .bind(("email_address", input.email_address))
            .bind(("warrantable", input.warrantable))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.try_into_member()?)
    }

    async fn get_by_id(&self, id: Uuid) -> KmpResult<Member> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('member', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.try_into_member()?)
    }

    async fn update(&self, id: Uuid, input: UpdateMember) -> KmpResult<Member> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.sca_name.is_some() {
            sets.push("sca_name = $sca_name");
        }
        if input.email_address.is_some() {
            sets.push("email_address = $email_address");
        }
        if input.warrantable.is_some() {
            sets.push("warrantable = $warrantable");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('member', $id) SET {}; \
             SELECT meta::id(id) AS record_id, * FROM type::record('member', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(sca_name) = input.sca_name {
            builder = builder.bind(("sca_name", sca_name));
        }
        if let Some(email_address) = input.email_address {
            builder = builder.bind(("email_address", email_address));
        }
        if let Some(warrantable) = input.warrantable {
            builder = builder.bind(("warrantable", warrantable));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.try_into_member()?)
    }
}
