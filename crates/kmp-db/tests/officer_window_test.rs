//! Integration tests for the Officer repository and the active-window
//! manager using in-memory SurrealDB.

use chrono::{DateTime, Duration, TimeZone, Utc};
use kmp_core::error::KmpError;
use kmp_core::models::officer::{CreateOfficer, Officer, ReportingFields};
use kmp_core::models::window::WindowStatus;
use kmp_core::repository::{
    ActiveWindowManager, MemberRoleRepository, OfficerRepository, StartWindow, StopWindow,
};
use kmp_db::SurrealActiveWindowManager;
use kmp_db::repository::{SurrealMemberRoleRepository, SurrealOfficerRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    kmp_db::run_migrations(&db).await.unwrap();
    db
}

fn officer_input(office_id: Uuid, branch_id: Uuid, status: WindowStatus) -> CreateOfficer {
    CreateOfficer {
        member_id: Uuid::new_v4(),
        branch_id,
        office_id,
        status,
        start_on: Utc::now() - Duration::days(10),
        expires_on: None,
        reporting: ReportingFields::default(),
        deputy_description: None,
        email_address: String::new(),
        approver_id: Uuid::new_v4(),
    }
}

fn start_window(officer: &Officer, start_on: DateTime<Utc>) -> StartWindow {
    StartWindow {
        entity_type: "officer".into(),
        entity_id: officer.id,
        approver_id: officer.approver_id,
        start_on,
        expires_on: None,
        term_length_months: 0,
        grants_role_id: None,
        close_existing: false,
        replaced_reason: "Replaced by new officer".into(),
        branch_id: Some(officer.branch_id),
    }
}

// -----------------------------------------------------------------------
// Officer repository
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_officer() {
    let db = setup().await;
    let repo = SurrealOfficerRepository::new(db);
    let (office_id, branch_id) = (Uuid::new_v4(), Uuid::new_v4());

    let mut input = officer_input(office_id, branch_id, WindowStatus::Current);
    input.reporting = ReportingFields {
        reports_to_office_id: Some(Uuid::new_v4()),
        reports_to_branch_id: Some(Uuid::new_v4()),
        ..Default::default()
    };
    input.deputy_description = Some("Youth combat".into());
    input.email_address = "marshal@example.org".into();
    let reporting = input.reporting;

    let officer = repo.create(input).await.unwrap();
    assert_eq!(officer.status, WindowStatus::Current);
    assert_eq!(officer.reporting(), reporting);
    assert_eq!(officer.deputy_description.as_deref(), Some("Youth combat"));
    assert_eq!(officer.revoker_id, None);

    let fetched = repo.get_by_id(officer.id).await.unwrap();
    assert_eq!(fetched, officer);
}

#[tokio::test]
async fn find_and_count_current_only() {
    let db = setup().await;
    let repo = SurrealOfficerRepository::new(db);
    let (office_id, branch_id) = (Uuid::new_v4(), Uuid::new_v4());

    let current = repo
        .create(officer_input(office_id, branch_id, WindowStatus::Current))
        .await
        .unwrap();
    repo.create(officer_input(office_id, branch_id, WindowStatus::Upcoming))
        .await
        .unwrap();
    repo.create(officer_input(office_id, branch_id, WindowStatus::Expired))
        .await
        .unwrap();
    repo.create(officer_input(office_id, Uuid::new_v4(), WindowStatus::Current))
        .await
        .unwrap();

    let found = repo.find_current(office_id, branch_id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, current.id);
    assert_eq!(repo.count_current(office_id, branch_id).await.unwrap(), 1);
    assert_eq!(
        repo.count_current(Uuid::new_v4(), branch_id).await.unwrap(),
        0
    );

    let all_current = repo
        .list_by_office(office_id, WindowStatus::Current)
        .await
        .unwrap();
    assert_eq!(all_current.len(), 2);
}

#[tokio::test]
async fn update_reporting_overwrites_snapshot() {
    let db = setup().await;
    let repo = SurrealOfficerRepository::new(db);
    let officer = repo
        .create(officer_input(Uuid::new_v4(), Uuid::new_v4(), WindowStatus::Current))
        .await
        .unwrap();

    let principal = Uuid::new_v4();
    let snapshot = ReportingFields {
        reports_to_office_id: Some(principal),
        reports_to_branch_id: Some(officer.branch_id),
        deputy_to_office_id: Some(principal),
        deputy_to_branch_id: Some(officer.branch_id),
    };
    let updated = repo.update_reporting(officer.id, snapshot).await.unwrap();
    assert_eq!(updated.reporting(), snapshot);

    let cleared = repo
        .update_reporting(officer.id, ReportingFields::default())
        .await
        .unwrap();
    assert_eq!(cleared.reporting(), ReportingFields::default());
}

#[tokio::test]
async fn expire_and_activate_by_date() {
    let db = setup().await;
    let repo = SurrealOfficerRepository::new(db);
    let now = Utc::now();

    let mut lapsed = officer_input(Uuid::new_v4(), Uuid::new_v4(), WindowStatus::Current);
    lapsed.expires_on = Some(now - Duration::days(1));
    let lapsed = repo.create(lapsed).await.unwrap();

    let mut started = officer_input(Uuid::new_v4(), Uuid::new_v4(), WindowStatus::Upcoming);
    started.start_on = now - Duration::hours(1);
    let started = repo.create(started).await.unwrap();

    let mut later = officer_input(Uuid::new_v4(), Uuid::new_v4(), WindowStatus::Upcoming);
    later.start_on = now + Duration::days(7);
    let later = repo.create(later).await.unwrap();

    assert_eq!(repo.expire_lapsed(now).await.unwrap(), 1);
    assert_eq!(repo.activate_started(now).await.unwrap(), 1);
    // Nothing left to do.
    assert_eq!(repo.expire_lapsed(now).await.unwrap(), 0);
    assert_eq!(repo.activate_started(now).await.unwrap(), 0);

    assert_eq!(
        repo.get_by_id(lapsed.id).await.unwrap().status,
        WindowStatus::Expired
    );
    assert_eq!(
        repo.get_by_id(started.id).await.unwrap().status,
        WindowStatus::Current
    );
    assert_eq!(
        repo.get_by_id(later.id).await.unwrap().status,
        WindowStatus::Upcoming
    );
}

// -----------------------------------------------------------------------
// Active-window manager
// -----------------------------------------------------------------------

#[tokio::test]
async fn start_derives_expiry_from_term() {
    let db = setup().await;
    let officers = SurrealOfficerRepository::new(db.clone());
    let windows = SurrealActiveWindowManager::new(db);
    let officer = officers
        .create(officer_input(Uuid::new_v4(), Uuid::new_v4(), WindowStatus::Upcoming))
        .await
        .unwrap();

    let start_on = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let mut input = start_window(&officer, start_on);
    input.term_length_months = 12;
    windows.start(input).await.unwrap();

    let officer = officers.get_by_id(officer.id).await.unwrap();
    assert_eq!(officer.start_on, start_on);
    assert_eq!(
        officer.expires_on,
        Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(officer.status, WindowStatus::Expired);
}

#[tokio::test]
async fn start_with_close_existing_replaces_live_holders() {
    let db = setup().await;
    let officers = SurrealOfficerRepository::new(db.clone());
    let windows = SurrealActiveWindowManager::new(db);
    let (office_id, branch_id) = (Uuid::new_v4(), Uuid::new_v4());

    let current = officers
        .create(officer_input(office_id, branch_id, WindowStatus::Current))
        .await
        .unwrap();
    let elsewhere = officers
        .create(officer_input(office_id, Uuid::new_v4(), WindowStatus::Current))
        .await
        .unwrap();
    let incoming = officers
        .create(officer_input(office_id, branch_id, WindowStatus::Current))
        .await
        .unwrap();

    let start_on = Utc::now() - Duration::days(1);
    let mut input = start_window(&incoming, start_on);
    input.close_existing = true;
    windows.start(input).await.unwrap();

    let replaced = officers.get_by_id(current.id).await.unwrap();
    assert_eq!(replaced.status, WindowStatus::Replaced);
    assert_eq!(replaced.revoker_id, Some(incoming.approver_id));
    assert_eq!(
        replaced.revoked_reason.as_deref(),
        Some("Replaced by new officer")
    );

    assert_eq!(
        officers.get_by_id(elsewhere.id).await.unwrap().status,
        WindowStatus::Current
    );
    assert_eq!(
        officers.get_by_id(incoming.id).await.unwrap().status,
        WindowStatus::Current
    );
}

#[tokio::test]
async fn start_rejects_unknown_entity_and_missing_record() {
    let db = setup().await;
    let officers = SurrealOfficerRepository::new(db.clone());
    let windows = SurrealActiveWindowManager::new(db);
    let officer = officers
        .create(officer_input(Uuid::new_v4(), Uuid::new_v4(), WindowStatus::Current))
        .await
        .unwrap();

    let mut input = start_window(&officer, Utc::now());
    input.entity_type = "warrant".into();
    assert!(matches!(
        windows.start(input).await,
        Err(KmpError::LifecycleFailed { .. })
    ));

    let mut input = start_window(&officer, Utc::now());
    input.entity_id = Uuid::new_v4();
    assert!(matches!(
        windows.start(input).await,
        Err(KmpError::NotFound { .. })
    ));
}

#[tokio::test]
async fn stop_closes_officer_and_granted_role() {
    let db = setup().await;
    let officers = SurrealOfficerRepository::new(db.clone());
    let roles = SurrealMemberRoleRepository::new(db.clone());
    let windows = SurrealActiveWindowManager::new(db);
    let officer = officers
        .create(officer_input(Uuid::new_v4(), Uuid::new_v4(), WindowStatus::Current))
        .await
        .unwrap();

    let role_id = Uuid::new_v4();
    let mut input = start_window(&officer, Utc::now() - Duration::days(1));
    input.grants_role_id = Some(role_id);
    windows.start(input).await.unwrap();

    let granted = officers
        .get_by_id(officer.id)
        .await
        .unwrap()
        .granted_member_role_id
        .expect("role granted");
    let member_roles = roles.list_by_member(officer.member_id).await.unwrap();
    assert_eq!(member_roles.len(), 1);
    assert_eq!(member_roles[0].id, granted);
    assert_eq!(member_roles[0].role_id, role_id);
    assert_eq!(member_roles[0].entity_type, "officer");

    let revoker_id = Uuid::new_v4();
    let revoked_on = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    windows
        .stop(StopWindow {
            entity_type: "officer".into(),
            entity_id: officer.id,
            revoker_id,
            status: WindowStatus::Deactivated,
            reason: "Branch dissolved".into(),
            expires_on: revoked_on,
        })
        .await
        .unwrap();

    let stopped = officers.get_by_id(officer.id).await.unwrap();
    assert_eq!(stopped.status, WindowStatus::Deactivated);
    assert_eq!(stopped.revoker_id, Some(revoker_id));
    assert_eq!(stopped.revoked_reason.as_deref(), Some("Branch dissolved"));
    assert_eq!(stopped.expires_on, Some(revoked_on));

    let role = roles.get_by_id(granted).await.unwrap();
    assert_eq!(role.status, WindowStatus::Deactivated);
    assert_eq!(role.revoker_id, Some(revoker_id));
    assert_eq!(role.expires_on, Some(revoked_on));
}

#[tokio::test]
async fn stop_rejects_live_status() {
    let db = setup().await;
    let officers = SurrealOfficerRepository::new(db.clone());
    let windows = SurrealActiveWindowManager::new(db);
    let officer = officers
        .create(officer_input(Uuid::new_v4(), Uuid::new_v4(), WindowStatus::Current))
        .await
        .unwrap();

    let result = windows
        .stop(StopWindow {
            entity_type: "officer".into(),
            entity_id: officer.id,
            revoker_id: Uuid::new_v4(),
            status: WindowStatus::Upcoming,
            reason: "no".into(),
            expires_on: Utc::now(),
        })
        .await;

    assert!(matches!(result, Err(KmpError::LifecycleFailed { .. })));
    assert_eq!(
        officers.get_by_id(officer.id).await.unwrap().status,
        WindowStatus::Current
    );
}
