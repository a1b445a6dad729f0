//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Statuses are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "officers_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Departments
-- =======================================================================
DEFINE TABLE department SCHEMAFULL;
DEFINE FIELD name ON TABLE department TYPE string;
DEFINE FIELD domain ON TABLE department TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE department TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE department TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_department_name ON TABLE department \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Offices (soft-deleted via `deleted`)
-- =======================================================================
DEFINE TABLE office SCHEMAFULL;
DEFINE FIELD name ON TABLE office TYPE string;
DEFINE FIELD department_id ON TABLE office TYPE string;
DEFINE FIELD requires_warrant ON TABLE office TYPE bool DEFAULT false;
DEFINE FIELD required_office ON TABLE office TYPE bool DEFAULT false;
DEFINE FIELD only_one_per_branch ON TABLE office TYPE bool DEFAULT false;
DEFINE FIELD can_skip_report ON TABLE office TYPE bool DEFAULT false;
DEFINE FIELD deputy_to_id ON TABLE office TYPE option<string>;
DEFINE FIELD reports_to_id ON TABLE office TYPE option<string>;
DEFINE FIELD grants_role_id ON TABLE office TYPE option<string>;
DEFINE FIELD term_length ON TABLE office TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD applicable_branch_types ON TABLE office TYPE array<string> \
    DEFAULT [];
DEFINE FIELD default_contact_address ON TABLE office TYPE option<string>;
DEFINE FIELD deleted ON TABLE office TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE office TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE office TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_office_name ON TABLE office COLUMNS name UNIQUE;
DEFINE INDEX idx_office_department ON TABLE office COLUMNS department_id;

-- =======================================================================
-- Branches (tree via parent_id)
-- =======================================================================
DEFINE TABLE branch SCHEMAFULL;
DEFINE FIELD name ON TABLE branch TYPE string;
DEFINE FIELD parent_id ON TABLE branch TYPE option<string>;
DEFINE FIELD branch_type ON TABLE branch TYPE string;
DEFINE FIELD created_at ON TABLE branch TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE branch TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_branch_name ON TABLE branch COLUMNS name UNIQUE;
DEFINE INDEX idx_branch_parent ON TABLE branch COLUMNS parent_id;

-- =======================================================================
-- Members
-- =======================================================================
DEFINE TABLE member SCHEMAFULL;
DEFINE FIELD sca_name ON TABLE member TYPE string;
DEFINE FIELD email_address ON TABLE member TYPE string;
DEFINE FIELD warrantable ON TABLE member TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE member TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE member TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Officers (time-boxed assignments)
-- =======================================================================
DEFINE TABLE officer SCHEMAFULL;
DEFINE FIELD member_id ON TABLE officer TYPE string;
DEFINE FIELD branch_id ON TABLE officer TYPE string;
DEFINE FIELD office_id ON TABLE officer TYPE string;
DEFINE FIELD status ON TABLE officer TYPE string \
    ASSERT $value IN ['Upcoming', 'Current', 'Expired', 'Released', \
    'Replaced', 'Deactivated'];
DEFINE FIELD start_on ON TABLE officer TYPE datetime;
DEFINE FIELD expires_on ON TABLE officer TYPE option<datetime>;
DEFINE FIELD reports_to_office_id ON TABLE officer TYPE option<string>;
DEFINE FIELD reports_to_branch_id ON TABLE officer TYPE option<string>;
DEFINE FIELD deputy_to_office_id ON TABLE officer TYPE option<string>;
DEFINE FIELD deputy_to_branch_id ON TABLE officer TYPE option<string>;
DEFINE FIELD deputy_description ON TABLE officer TYPE option<string>;
DEFINE FIELD email_address ON TABLE officer TYPE string DEFAULT '';
DEFINE FIELD approver_id ON TABLE officer TYPE string;
DEFINE FIELD approval_date ON TABLE officer TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD revoker_id ON TABLE officer TYPE option<string>;
DEFINE FIELD revoked_reason ON TABLE officer TYPE option<string>;
DEFINE FIELD granted_member_role_id ON TABLE officer TYPE option<string>;
DEFINE FIELD created_at ON TABLE officer TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE officer TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_officer_slot ON TABLE officer \
    COLUMNS office_id, branch_id, status;
DEFINE INDEX idx_officer_member ON TABLE officer COLUMNS member_id;

-- =======================================================================
-- Member roles (granted for the duration of an active window)
-- =======================================================================
DEFINE TABLE member_role SCHEMAFULL;
DEFINE FIELD member_id ON TABLE member_role TYPE string;
DEFINE FIELD role_id ON TABLE member_role TYPE string;
DEFINE FIELD branch_id ON TABLE member_role TYPE option<string>;
DEFINE FIELD entity_type ON TABLE member_role TYPE string;
DEFINE FIELD entity_id ON TABLE member_role TYPE string;
DEFINE FIELD approver_id ON TABLE member_role TYPE string;
DEFINE FIELD start_on ON TABLE member_role TYPE datetime;
DEFINE FIELD expires_on ON TABLE member_role TYPE option<datetime>;
DEFINE FIELD revoker_id ON TABLE member_role TYPE option<string>;
DEFINE FIELD revoked_reason ON TABLE member_role TYPE option<string>;
DEFINE FIELD status ON TABLE member_role TYPE string \
    ASSERT $value IN ['Upcoming', 'Current', 'Expired', 'Released', \
    'Replaced', 'Deactivated'];
DEFINE FIELD created_at ON TABLE member_role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE member_role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_member_role_member ON TABLE member_role \
    COLUMNS member_id;
DEFINE INDEX idx_member_role_slot ON TABLE member_role \
    COLUMNS member_id, role_id, status;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query(
            "CREATE _migration SET version = $version, \
             name = $name",
        )
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "Failed to record migration v{}: {}",
                migration.version, e,
            ))
        })?;

        info!(version = migration.version, "Migration applied");
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
