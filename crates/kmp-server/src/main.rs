//! KMP Server: officer maintenance entry point.
//!
//! Connects to the officers database, applies pending migrations and brings
//! officer statuses in line with today's date.

use std::process::ExitCode;

use chrono::Utc;
use kmp_core::error::KmpError;
use kmp_db::repository::{
    SurrealBranchRepository, SurrealMemberRepository, SurrealMemberRoleRepository,
    SurrealOfficeRepository, SurrealOfficerRepository,
};
use kmp_db::{DbConfig, DbManager, SurrealActiveWindowManager};
use kmp_officers::{OfficerConfig, OfficerService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kmp=info")),
        )
        .json()
        .init();

    tracing::info!("Starting KMP officer maintenance...");

    match run().await {
        Ok(()) => {
            tracing::info!("KMP officer maintenance finished.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "KMP officer maintenance failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), KmpError> {
    let config = DbConfig::from_env();
    let manager = DbManager::connect_and_migrate(&config).await?;
    let db = manager.client().clone();

    let service = OfficerService::new(
        SurrealOfficeRepository::new(db.clone()),
        SurrealBranchRepository::new(db.clone()),
        SurrealOfficerRepository::new(db.clone()),
        SurrealMemberRepository::new(db.clone()),
        SurrealMemberRoleRepository::new(db.clone()),
        SurrealActiveWindowManager::new(db),
        OfficerConfig::default(),
    );

    let summary = service.sync_statuses(Utc::now()).await?;
    tracing::info!(
        expired = summary.expired,
        activated = summary.activated,
        roles_expired = summary.roles_expired,
        roles_activated = summary.roles_activated,
        "Officer statuses up to date"
    );

    Ok(())
}
