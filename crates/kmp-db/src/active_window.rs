//! SurrealDB implementation of [`ActiveWindowManager`].
//!
//! Every time-boxed table (`officer`, `member_role`) carries the same window
//! columns: `start_on`, `expires_on`, `status`, `revoker_id` and
//! `revoked_reason`. Starting a window may displace the records occupying the
//! same slot and may grant a role; stopping it closes the record and any role
//! it granted.

use chrono::Utc;
use kmp_core::error::{KmpError, KmpResult};
use kmp_core::models::member_role::MEMBER_ROLE_ENTITY;
use kmp_core::models::officer::OFFICER_ENTITY;
use kmp_core::models::window::{WindowStatus, expiry_for_term};
use kmp_core::repository::{ActiveWindowManager, StartWindow, StopWindow};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{opt_to_string, parse_uuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowTable {
    Officer,
    MemberRole,
}

impl WindowTable {
    fn parse(entity_type: &str) -> KmpResult<Self> {
        match entity_type {
            OFFICER_ENTITY => Ok(WindowTable::Officer),
            MEMBER_ROLE_ENTITY => Ok(WindowTable::MemberRole),
            other => Err(KmpError::LifecycleFailed {
                reason: format!("Unsupported active window entity: {other}"),
            }),
        }
    }

    fn name(self) -> &'static str {
        match self {
            WindowTable::Officer => OFFICER_ENTITY,
            WindowTable::MemberRole => MEMBER_ROLE_ENTITY,
        }
    }

    /// Columns that identify the slot a record occupies.
    fn slot_fields(self) -> (&'static str, &'static str) {
        match self {
            WindowTable::Officer => ("office_id", "branch_id"),
            WindowTable::MemberRole => ("member_id", "role_id"),
        }
    }

    fn granted_role_column(self) -> &'static str {
        match self {
            WindowTable::Officer => "granted_member_role_id",
            WindowTable::MemberRole => "NONE AS granted_member_role_id",
        }
    }
}

#[derive(Debug, SurrealValue)]
struct WindowRecordRow {
    member_id: String,
    slot_a: String,
    slot_b: String,
    granted_member_role_id: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

/// Active-window manager backed by the officers database.
#[derive(Clone)]
pub struct SurrealActiveWindowManager<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActiveWindowManager<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn load(&self, table: WindowTable, id: Uuid) -> KmpResult<WindowRecordRow> {
        let (slot_a, slot_b) = table.slot_fields();
        let query = format!(
            "SELECT member_id, {slot_a} AS slot_a, {slot_b} AS slot_b, {} \
             FROM type::record('{}', $id)",
            table.granted_role_column(),
            table.name(),
        );

        let mut result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WindowRecordRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| KmpError::not_found(table.name(), id))
    }

    /// Other live records occupying the same slot as `id`.
    async fn occupants(
        &self,
        table: WindowTable,
        id: Uuid,
        record: &WindowRecordRow,
    ) -> KmpResult<Vec<Uuid>> {
        let (slot_a, slot_b) = table.slot_fields();
        let query = format!(
            "SELECT meta::id(id) AS record_id FROM {} \
             WHERE {slot_a} = $slot_a AND {slot_b} = $slot_b \
             AND status IN ['Current', 'Upcoming'] \
             AND meta::id(id) != $id",
            table.name(),
        );

        let mut result = self
            .db
            .query(query)
            .bind(("slot_a", record.slot_a.clone()))
            .bind(("slot_b", record.slot_b.clone()))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        rows.iter()
            .map(|row| parse_uuid(&row.record_id, table.name()).map_err(Into::into))
            .collect()
    }
}

impl<C: Connection> ActiveWindowManager for SurrealActiveWindowManager<C> {
    async fn start(&self, input: StartWindow) -> KmpResult<()> {
        let table = WindowTable::parse(&input.entity_type)?;
        let record = self.load(table, input.entity_id).await?;

        if input.close_existing {
            for occupant in self.occupants(table, input.entity_id, &record).await? {
                debug!(
                    entity = table.name(),
                    replaced = %occupant,
                    by = %input.entity_id,
                    "Closing existing window"
                );
                self.stop(StopWindow {
                    entity_type: input.entity_type.clone(),
                    entity_id: occupant,
                    revoker_id: input.approver_id,
                    status: WindowStatus::Replaced,
                    reason: input.replaced_reason.clone(),
                    expires_on: input.start_on,
                })
                .await
                .map_err(|e| KmpError::LifecycleFailed {
                    reason: format!("Failed to expire current {}: {e}", table.name()),
                })?;
            }
        }

        let expires_on = input
            .expires_on
            .or_else(|| expiry_for_term(input.start_on, input.term_length_months));
        let status = WindowStatus::for_window(input.start_on, expires_on, Utc::now());

        self.db
            .query(format!(
                "UPDATE type::record('{}', $id) SET \
                 start_on = $start_on, expires_on = $expires_on, \
                 status = $status, updated_at = time::now()",
                table.name()
            ))
            .bind(("id", input.entity_id.to_string()))
            .bind(("start_on", input.start_on))
            .bind(("expires_on", expires_on))
            .bind(("status", status.as_str()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|_| KmpError::LifecycleFailed {
                reason: format!("Failed to save {}", table.name()),
            })?;

        if let Some(role_id) = input.grants_role_id {
            if table != WindowTable::Officer {
                return Err(KmpError::LifecycleFailed {
                    reason: format!("{} windows cannot grant roles", table.name()),
                });
            }

            let member_role_id = Uuid::new_v4().to_string();
            self.db
                .query(
                    "CREATE type::record('member_role', $member_role_id) SET \
                     member_id = $member_id, role_id = $role_id, \
                     branch_id = $branch_id, entity_type = $entity_type, \
                     entity_id = $id, approver_id = $approver_id, \
                     start_on = $start_on, expires_on = $expires_on, \
                     status = $status; \
                     UPDATE type::record('officer', $id) SET \
                     granted_member_role_id = $member_role_id;",
                )
                .bind(("member_role_id", member_role_id.clone()))
                .bind(("member_id", record.member_id.clone()))
                .bind(("role_id", role_id.to_string()))
                .bind(("branch_id", opt_to_string(input.branch_id)))
                .bind(("entity_type", table.name()))
                .bind(("id", input.entity_id.to_string()))
                .bind(("approver_id", input.approver_id.to_string()))
                .bind(("start_on", input.start_on))
                .bind(("expires_on", expires_on))
                .bind(("status", status.as_str()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(|_| KmpError::LifecycleFailed {
                    reason: "Failed to Assign Role from Member".into(),
                })?;

            debug!(member_role = %member_role_id, role = %role_id, "Granted role");
        }

        info!(
            entity = table.name(),
            id = %input.entity_id,
            status = %status,
            "Active window started"
        );

        Ok(())
    }

    async fn stop(&self, input: StopWindow) -> KmpResult<()> {
        let table = WindowTable::parse(&input.entity_type)?;
        if !input.status.is_terminal() {
            return Err(KmpError::LifecycleFailed {
                reason: format!("{} is not a closing status", input.status),
            });
        }

        let record = self.load(table, input.entity_id).await?;

        self.db
            .query(format!(
                "UPDATE type::record('{}', $id) SET \
                 expires_on = $expires_on, revoker_id = $revoker_id, \
                 status = $status, revoked_reason = $reason, \
                 updated_at = time::now()",
                table.name()
            ))
            .bind(("id", input.entity_id.to_string()))
            .bind(("expires_on", input.expires_on))
            .bind(("revoker_id", input.revoker_id.to_string()))
            .bind(("status", input.status.as_str()))
            .bind(("reason", input.reason.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|_| KmpError::LifecycleFailed {
                reason: format!("Failed to save {}", table.name()),
            })?;

        if let Some(member_role_id) = record.granted_member_role_id {
            self.db
                .query(
                    "UPDATE type::record('member_role', $id) SET \
                     expires_on = $expires_on, revoker_id = $revoker_id, \
                     status = $status, revoked_reason = $reason, \
                     updated_at = time::now()",
                )
                .bind(("id", member_role_id))
                .bind(("expires_on", input.expires_on))
                .bind(("revoker_id", input.revoker_id.to_string()))
                .bind(("status", input.status.as_str()))
                .bind(("reason", input.reason.clone()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(|_| KmpError::LifecycleFailed {
                    reason: "Failed to Remove Role from Member".into(),
                })?;
        }

        info!(
            entity = table.name(),
            id = %input.entity_id,
            status = %input.status,
            "Active window stopped"
        );

        Ok(())
    }
}
