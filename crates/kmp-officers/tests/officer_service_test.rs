//! Integration tests for the officer service using in-memory SurrealDB.

use chrono::{Duration, TimeZone, Utc};
use kmp_core::error::KmpError;
use kmp_core::models::branch::CreateBranch;
use kmp_core::models::department::CreateDepartment;
use kmp_core::models::member::{CreateMember, Member};
use kmp_core::models::office::{CreateOffice, Office, OfficeHierarchy, UpdateOffice};
use kmp_core::models::officer::Officer;
use kmp_core::models::window::WindowStatus;
use kmp_core::repository::{
    BranchRepository, DepartmentRepository, MemberRepository, MemberRoleRepository,
    OfficeRepository, OfficerRepository,
};
use kmp_db::SurrealActiveWindowManager;
use kmp_db::repository::{
    SurrealBranchRepository, SurrealDepartmentRepository, SurrealMemberRepository,
    SurrealMemberRoleRepository, SurrealOfficeRepository, SurrealOfficerRepository,
};
use kmp_officers::{AssignOfficer, OfficerConfig, OfficerService, ReleaseOfficer};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = OfficerService<
    SurrealOfficeRepository<Db>,
    SurrealBranchRepository<Db>,
    SurrealOfficerRepository<Db>,
    SurrealMemberRepository<Db>,
    SurrealMemberRoleRepository<Db>,
    SurrealActiveWindowManager<Db>,
>;

/// Kingdom > Principality > Region > Barony, plus one department.
struct Fixture {
    db: Surreal<Db>,
    service: Service,
    department_id: Uuid,
    approver_id: Uuid,
    kingdom: Uuid,
    principality: Uuid,
    region: Uuid,
    barony: Uuid,
}

/// Spin up in-memory DB, run migrations, create the branch tree.
async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    kmp_db::run_migrations(&db).await.unwrap();

    let department = SurrealDepartmentRepository::new(db.clone())
        .create(CreateDepartment {
            name: "Seneschallate".into(),
            domain: "seneschal".into(),
        })
        .await
        .unwrap();

    let branches = SurrealBranchRepository::new(db.clone());
    let mut parent = None;
    let mut ids = Vec::new();
    for (name, branch_type) in [
        ("Ansteorra", "Kingdom"),
        ("Northkeep", "Principality"),
        ("Central Region", "Region"),
        ("Bjornsborg", "Local Group"),
    ] {
        let branch = branches
            .create(CreateBranch {
                name: name.into(),
                parent_id: parent,
                branch_type: branch_type.into(),
            })
            .await
            .unwrap();
        parent = Some(branch.id);
        ids.push(branch.id);
    }

    let service = OfficerService::new(
        SurrealOfficeRepository::new(db.clone()),
        branches,
        SurrealOfficerRepository::new(db.clone()),
        SurrealMemberRepository::new(db.clone()),
        SurrealMemberRoleRepository::new(db.clone()),
        SurrealActiveWindowManager::new(db.clone()),
        OfficerConfig::default(),
    );

    Fixture {
        db,
        service,
        department_id: department.id,
        approver_id: Uuid::new_v4(),
        kingdom: ids[0],
        principality: ids[1],
        region: ids[2],
        barony: ids[3],
    }
}

impl Fixture {
    fn offices(&self) -> SurrealOfficeRepository<Db> {
        SurrealOfficeRepository::new(self.db.clone())
    }

    async fn office(&self, input: CreateOffice) -> Office {
        self.offices().create(input).await.unwrap()
    }

    async fn member(&self, sca_name: &str, warrantable: bool) -> Member {
        SurrealMemberRepository::new(self.db.clone())
            .create(CreateMember {
                sca_name: sca_name.into(),
                email_address: format!("{}@example.org", sca_name.replace(' ', ".")),
                warrantable,
            })
            .await
            .unwrap()
    }

    /// An assignment that started a month ago.
    fn request(&self, office: &Office, member: &Member, branch_id: Uuid) -> AssignOfficer {
        AssignOfficer {
            office_id: office.id,
            member_id: member.id,
            branch_id,
            start_on: Utc::now() - Duration::days(30),
            end_on: None,
            deputy_description: None,
            approver_id: self.approver_id,
            email_address: None,
        }
    }

    async fn assign(&self, office: &Office, member: &Member, branch_id: Uuid) -> Officer {
        self.service
            .assign(self.request(office, member, branch_id))
            .await
            .unwrap()
    }

    /// Regional office reporting to a principality office.
    async fn seneschal_chain(&self) -> (Office, Office) {
        let crown = self
            .office(CreateOffice::new("Principality Seneschal", self.department_id, 24))
            .await;
        let regional = self
            .office(
                CreateOffice::new("Regional Seneschal", self.department_id, 24)
                    .reporting_to(crown.id),
            )
            .await;
        (crown, regional)
    }
}

// -----------------------------------------------------------------------
// Reporting snapshot
// -----------------------------------------------------------------------

#[tokio::test]
async fn deputy_reports_to_principal_in_own_branch() {
    let fx = setup().await;
    let (_, regional) = fx.seneschal_chain().await;
    let deputy = fx
        .office(
            CreateOffice::new("Deputy Regional Seneschal", fx.department_id, 24)
                .deputy_of(regional.id),
        )
        .await;
    let member = fx.member("Aldric of Wyke", false).await;

    let officer = fx.assign(&deputy, &member, fx.region).await;

    assert_eq!(officer.reports_to_office_id, Some(regional.id));
    assert_eq!(officer.reports_to_branch_id, Some(fx.region));
    assert_eq!(officer.deputy_to_office_id, Some(regional.id));
    assert_eq!(officer.deputy_to_branch_id, Some(fx.region));
}

#[tokio::test]
async fn non_skipping_office_reports_to_parent_even_when_vacant() {
    let fx = setup().await;
    let (_, regional) = fx.seneschal_chain().await;
    let local = fx
        .office(CreateOffice::new("Local Seneschal", fx.department_id, 24).reporting_to(regional.id))
        .await;
    let member = fx.member("Brigid Ni Cheallaigh", false).await;

    let officer = fx.assign(&local, &member, fx.barony).await;

    assert_eq!(officer.reports_to_office_id, Some(regional.id));
    assert_eq!(officer.reports_to_branch_id, Some(fx.region));
    assert_eq!(officer.deputy_to_office_id, None);
}

#[tokio::test]
async fn skipping_office_reports_to_nearest_occupied_ancestor() {
    let fx = setup().await;
    let (crown, _) = fx.seneschal_chain().await;
    let mut input = CreateOffice::new("Local Herald", fx.department_id, 24).reporting_to(crown.id);
    input.can_skip_report = true;
    let herald = fx.office(input).await;

    // Region is vacant, the principality is held.
    let holder = fx.member("Cedric the Bold", false).await;
    fx.assign(&crown, &holder, fx.principality).await;

    let member = fx.member("Dagny Ragnarsdottir", false).await;
    let officer = fx.assign(&herald, &member, fx.barony).await;

    assert_eq!(officer.reports_to_office_id, Some(crown.id));
    assert_eq!(officer.reports_to_branch_id, Some(fx.principality));
}

#[tokio::test]
async fn skip_walk_ignores_upcoming_holders_and_falls_back_to_root() {
    let fx = setup().await;
    let (crown, _) = fx.seneschal_chain().await;
    let mut input = CreateOffice::new("Local Herald", fx.department_id, 24).reporting_to(crown.id);
    input.can_skip_report = true;
    let herald = fx.office(input).await;

    let holder = fx.member("Cedric the Bold", false).await;
    let mut upcoming = fx.request(&crown, &holder, fx.region);
    upcoming.start_on = Utc::now() + Duration::days(10);
    let upcoming = fx.service.assign(upcoming).await.unwrap();
    assert_eq!(upcoming.status, WindowStatus::Upcoming);

    let member = fx.member("Dagny Ragnarsdottir", false).await;
    let officer = fx.assign(&herald, &member, fx.barony).await;

    assert_eq!(officer.reports_to_branch_id, Some(fx.kingdom));
}

#[tokio::test]
async fn skip_walk_past_depth_limit_is_rejected() {
    let fx = setup().await;
    let (crown, _) = fx.seneschal_chain().await;
    let mut input = CreateOffice::new("Local Herald", fx.department_id, 24).reporting_to(crown.id);
    input.can_skip_report = true;
    let herald = fx.office(input).await;
    let member = fx.member("Dagny Ragnarsdottir", false).await;

    let shallow: Service = OfficerService::new(
        SurrealOfficeRepository::new(fx.db.clone()),
        SurrealBranchRepository::new(fx.db.clone()),
        SurrealOfficerRepository::new(fx.db.clone()),
        SurrealMemberRepository::new(fx.db.clone()),
        SurrealMemberRoleRepository::new(fx.db.clone()),
        SurrealActiveWindowManager::new(fx.db.clone()),
        OfficerConfig {
            max_hierarchy_depth: 1,
            ..OfficerConfig::default()
        },
    );

    let err = shallow
        .assign(fx.request(&herald, &member, fx.barony))
        .await
        .unwrap_err();
    assert!(matches!(err, KmpError::Validation { .. }));
}

#[tokio::test]
async fn root_branch_reports_to_itself() {
    let fx = setup().await;
    let (crown, _) = fx.seneschal_chain().await;
    let member = fx.member("Eleanor of Aquitaine", false).await;

    let officer = fx.assign(&crown, &member, fx.kingdom).await;

    assert_eq!(officer.reports_to_office_id, None);
    assert_eq!(officer.reports_to_branch_id, Some(fx.kingdom));
}

// -----------------------------------------------------------------------
// Assignment window and validation
// -----------------------------------------------------------------------

#[tokio::test]
async fn end_date_defaults_to_term_length() {
    let fx = setup().await;
    let office = fx
        .office(CreateOffice::new("Exchequer", fx.department_id, 12))
        .await;
    let member = fx.member("Finnian mac Cormac", false).await;

    let mut request = fx.request(&office, &member, fx.barony);
    request.start_on = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let officer = fx.service.assign(request).await.unwrap();

    assert_eq!(
        officer.expires_on,
        Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    );
    // The whole window lies in the past.
    assert_eq!(officer.status, WindowStatus::Expired);
}

#[tokio::test]
async fn zero_term_is_open_ended() {
    let fx = setup().await;
    let office = fx
        .office(CreateOffice::new("Chronicler", fx.department_id, 0))
        .await;
    let member = fx.member("Gwenllian verch Rhys", false).await;

    let officer = fx.assign(&office, &member, fx.barony).await;

    assert_eq!(officer.expires_on, None);
    assert_eq!(officer.status, WindowStatus::Current);
}

#[tokio::test]
async fn future_start_is_upcoming() {
    let fx = setup().await;
    let office = fx
        .office(CreateOffice::new("Chatelaine", fx.department_id, 24))
        .await;
    let member = fx.member("Hild of Whitby", false).await;

    let mut request = fx.request(&office, &member, fx.barony);
    request.start_on = Utc::now() + Duration::days(14);
    let officer = fx.service.assign(request).await.unwrap();

    assert_eq!(officer.status, WindowStatus::Upcoming);
}

#[tokio::test]
async fn warranted_office_rejects_unwarrantable_member() {
    let fx = setup().await;
    let mut input = CreateOffice::new("Knight Marshal", fx.department_id, 24);
    input.requires_warrant = true;
    let office = fx.office(input).await;
    let member = fx.member("Ivo the Unready", false).await;

    let err = fx
        .service
        .assign(fx.request(&office, &member, fx.barony))
        .await
        .unwrap_err();

    match err {
        KmpError::Validation { message } => assert_eq!(message, "Member is not warrantable"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn assign_rejects_unknown_office() {
    let fx = setup().await;
    let office = fx
        .office(CreateOffice::new("Webminister", fx.department_id, 24))
        .await;
    let member = fx.member("Joan of Kent", false).await;

    let mut request = fx.request(&office, &member, fx.barony);
    request.office_id = Uuid::new_v4();
    let err = fx.service.assign(request).await.unwrap_err();

    assert!(matches!(err, KmpError::Validation { .. }));
}

#[tokio::test]
async fn assign_rejects_inapplicable_branch_type() {
    let fx = setup().await;
    let mut input = CreateOffice::new("Kingdom Earl Marshal", fx.department_id, 24);
    input.applicable_branch_types = vec!["Kingdom".into()];
    let office = fx.office(input).await;
    let member = fx.member("Kenric Ironhand", true).await;

    let err = fx
        .service
        .assign(fx.request(&office, &member, fx.barony))
        .await
        .unwrap_err();

    assert!(matches!(err, KmpError::Validation { .. }));
}

#[tokio::test]
async fn one_per_branch_office_replaces_current_holder() {
    let fx = setup().await;
    let mut input = CreateOffice::new("Seneschal", fx.department_id, 24);
    input.only_one_per_branch = true;
    let office = fx.office(input).await;

    let first = fx.member("Leofric", false).await;
    let second = fx.member("Matilda", false).await;
    let old = fx.assign(&office, &first, fx.barony).await;
    let new = fx.assign(&office, &second, fx.barony).await;

    let officers = SurrealOfficerRepository::new(fx.db.clone());
    let old = officers.get_by_id(old.id)
        .await
        .unwrap();

    assert_eq!(old.status, WindowStatus::Replaced);
    assert_eq!(old.revoked_reason.as_deref(), Some("Replaced by new officer"));
    assert_eq!(old.revoker_id, Some(fx.approver_id));
    assert_eq!(new.status, WindowStatus::Current);
}

#[tokio::test]
async fn shared_office_keeps_existing_holders() {
    let fx = setup().await;
    let herald = fx
        .office(CreateOffice::new("Herald", fx.department_id, 24))
        .await;
    let first = fx.assign(&herald, &fx.member("Leofric", false).await, fx.barony).await;
    let second = fx.assign(&herald, &fx.member("Matilda", false).await, fx.barony).await;

    let pursuivant = fx
        .office(CreateOffice::new("Pursuivant", fx.department_id, 24).deputy_of(herald.id))
        .await;
    let deputy = fx
        .assign(&pursuivant, &fx.member("Nesta", false).await, fx.barony)
        .await;

    let holders = fx.service.effective_reports_to(&deputy).await.unwrap();
    let ids: Vec<Uuid> = holders.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

// -----------------------------------------------------------------------
// Release and role grants
// -----------------------------------------------------------------------

#[tokio::test]
async fn release_records_revoker_and_reason() {
    let fx = setup().await;
    let office = fx
        .office(CreateOffice::new("Minister of Arts", fx.department_id, 24))
        .await;
    let member = fx.member("Osric", false).await;
    let officer = fx.assign(&office, &member, fx.barony).await;

    let revoker_id = Uuid::new_v4();
    let revoked_on = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    let released = fx
        .service
        .release(ReleaseOfficer {
            officer_id: officer.id,
            revoker_id,
            revoked_on,
            reason: "Stepped down".into(),
            status: None,
        })
        .await
        .unwrap();

    assert_eq!(released.status, WindowStatus::Released);
    assert_eq!(released.revoker_id, Some(revoker_id));
    assert_eq!(released.revoked_reason.as_deref(), Some("Stepped down"));
    assert_eq!(released.expires_on, Some(revoked_on));
}

#[tokio::test]
async fn release_with_live_status_fails_with_manager_reason() {
    let fx = setup().await;
    let office = fx
        .office(CreateOffice::new("Minister of Arts", fx.department_id, 24))
        .await;
    let member = fx.member("Osric", false).await;
    let officer = fx.assign(&office, &member, fx.barony).await;

    let err = fx
        .service
        .release(ReleaseOfficer {
            officer_id: officer.id,
            revoker_id: Uuid::new_v4(),
            revoked_on: Utc::now(),
            reason: "Oops".into(),
            status: Some(WindowStatus::Current),
        })
        .await
        .unwrap_err();

    match err {
        KmpError::LifecycleFailed { reason } => {
            assert_eq!(reason, "Current is not a closing status");
        }
        other => panic!("expected lifecycle failure, got {other:?}"),
    }
}

#[tokio::test]
async fn granted_role_follows_the_assignment() {
    let fx = setup().await;
    let role_id = Uuid::new_v4();
    let mut input = CreateOffice::new("Marshal", fx.department_id, 24);
    input.grants_role_id = Some(role_id);
    let office = fx.office(input).await;
    let member = fx.member("Percival", false).await;

    let officer = fx.assign(&office, &member, fx.barony).await;
    let member_role_id = officer.granted_member_role_id.expect("role granted");

    let roles = SurrealMemberRoleRepository::new(fx.db.clone());
    let role = roles.get_by_id(member_role_id).await.unwrap();
    assert_eq!(role.role_id, role_id);
    assert_eq!(role.member_id, member.id);
    assert_eq!(role.entity_id, officer.id);
    assert_eq!(role.status, WindowStatus::Current);

    fx.service
        .release(ReleaseOfficer {
            officer_id: officer.id,
            revoker_id: fx.approver_id,
            revoked_on: Utc::now(),
            reason: "Term cut short".into(),
            status: None,
        })
        .await
        .unwrap();

    let role = roles.get_by_id(member_role_id).await.unwrap();
    assert_eq!(role.status, WindowStatus::Released);
    assert_eq!(role.revoker_id, Some(fx.approver_id));
}

// -----------------------------------------------------------------------
// Resolution and display
// -----------------------------------------------------------------------

#[tokio::test]
async fn resolution_is_idempotent() {
    let fx = setup().await;
    let (crown, regional) = fx.seneschal_chain().await;
    let holder = fx.member("Quintus", false).await;
    fx.assign(&crown, &holder, fx.principality).await;
    let member = fx.member("Rowena", false).await;
    let officer = fx.assign(&regional, &member, fx.region).await;

    let first = fx.service.effective_reports_to(&officer).await.unwrap();
    let second = fx.service.effective_reports_to(&officer).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn resolution_follows_the_current_holder() {
    let fx = setup().await;
    let (crown, regional) = fx.seneschal_chain().await;
    let member = fx.member("Rowena", false).await;
    let officer = fx.assign(&regional, &member, fx.region).await;
    assert!(fx.service.effective_reports_to(&officer).await.unwrap().is_empty());

    let holder = fx.member("Quintus", false).await;
    let superior = fx.assign(&crown, &holder, fx.principality).await;

    let resolved = fx.service.effective_reports_to(&officer).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, superior.id);
}

#[tokio::test]
async fn format_reports_to_society_at_the_top() {
    let fx = setup().await;
    let (crown, _) = fx.seneschal_chain().await;
    let member = fx.member("Sigrid", false).await;
    let officer = fx.assign(&crown, &member, fx.kingdom).await;

    assert_eq!(fx.service.format_reports_to(&officer).await.unwrap(), "Society");
}

#[tokio::test]
async fn format_reports_to_links_holder_email() {
    let fx = setup().await;
    let (crown, regional) = fx.seneschal_chain().await;
    let holder = fx.member("Jane Doe", false).await;
    let mut request = fx.request(&crown, &holder, fx.principality);
    request.email_address = Some("a@b.com".into());
    fx.service.assign(request).await.unwrap();

    let member = fx.member("Tancred", false).await;
    let officer = fx.assign(&regional, &member, fx.region).await;

    assert_eq!(
        fx.service.format_reports_to(&officer).await.unwrap(),
        "<a href='mailto:a@b.com'>Jane Doe</a>"
    );
}

#[tokio::test]
async fn format_reports_to_bare_name_without_email() {
    let fx = setup().await;
    let (crown, regional) = fx.seneschal_chain().await;
    let holder = fx.member("Jane Doe", false).await;
    fx.assign(&crown, &holder, fx.principality).await;

    let member = fx.member("Tancred", false).await;
    let officer = fx.assign(&regional, &member, fx.region).await;

    assert_eq!(fx.service.format_reports_to(&officer).await.unwrap(), "Jane Doe");
}

#[tokio::test]
async fn format_reports_to_vacant_office_is_not_filled() {
    let fx = setup().await;
    let (_, regional) = fx.seneschal_chain().await;
    let member = fx.member("Ulric", false).await;
    let officer = fx.assign(&regional, &member, fx.region).await;

    assert_eq!(
        fx.service.format_reports_to(&officer).await.unwrap(),
        "Not Filled"
    );
}

#[tokio::test]
async fn format_reports_to_lists_principal_once_for_deputy() {
    let fx = setup().await;
    let (_, regional) = fx.seneschal_chain().await;
    let deputy = fx
        .office(
            CreateOffice::new("Deputy Regional Seneschal", fx.department_id, 24)
                .deputy_of(regional.id),
        )
        .await;

    let principal = fx.member("Jane Doe", false).await;
    let mut request = fx.request(&regional, &principal, fx.region);
    request.email_address = Some("a@b.com".into());
    fx.service.assign(request).await.unwrap();

    let member = fx.member("Vivian", false).await;
    let officer = fx.assign(&deputy, &member, fx.region).await;

    assert_eq!(
        fx.service.format_reports_to(&officer).await.unwrap(),
        "<a href='mailto:a@b.com'>Jane Doe</a>"
    );
}

#[tokio::test]
async fn escalation_climbs_past_vacant_office() {
    let fx = setup().await;
    let (crown, regional) = fx.seneschal_chain().await;
    let local = fx
        .office(CreateOffice::new("Local Seneschal", fx.department_id, 24).reporting_to(regional.id))
        .await;

    let holder = fx.member("Wulfstan", false).await;
    let superior = fx.assign(&crown, &holder, fx.principality).await;
    let member = fx.member("Xanthe", false).await;
    let officer = fx.assign(&local, &member, fx.barony).await;

    assert!(fx.service.effective_reports_to(&officer).await.unwrap().is_empty());
    let escalated = fx.service.escalated_reports_to(&officer).await.unwrap();
    assert_eq!(escalated.len(), 1);
    assert_eq!(escalated[0].id, superior.id);
}

#[tokio::test]
async fn escalation_stops_at_the_top() {
    let fx = setup().await;
    let (_, regional) = fx.seneschal_chain().await;
    let member = fx.member("Yrsa", false).await;
    let officer = fx.assign(&regional, &member, fx.region).await;

    assert!(fx.service.escalated_reports_to(&officer).await.unwrap().is_empty());
}

// -----------------------------------------------------------------------
// Recalculation and status sync
// -----------------------------------------------------------------------

#[tokio::test]
async fn recalculate_applies_new_hierarchy() {
    let fx = setup().await;
    let (_, regional) = fx.seneschal_chain().await;
    let local = fx
        .office(CreateOffice::new("Local Seneschal", fx.department_id, 24))
        .await;
    let member = fx.member("Zephyrine", false).await;
    let officer = fx.assign(&local, &member, fx.barony).await;
    assert_eq!(officer.reports_to_office_id, None);

    fx.offices()
        .update(
            local.id,
            UpdateOffice {
                hierarchy: Some(OfficeHierarchy::ReportsTo(regional.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let summary = fx
        .service
        .recalculate_officers_for_office(local.id, fx.approver_id)
        .await
        .unwrap();
    assert_eq!(summary.current_count, 1);
    assert_eq!(summary.upcoming_count, 0);
    assert_eq!(summary.updated_count, 1);

    let officers = SurrealOfficerRepository::new(fx.db.clone());
    let officer = officers.get_by_id(officer.id)
        .await
        .unwrap();
    assert_eq!(officer.reports_to_office_id, Some(regional.id));
    assert_eq!(officer.reports_to_branch_id, Some(fx.region));

    // Nothing left to change.
    let again = fx
        .service
        .recalculate_officers_for_office(local.id, fx.approver_id)
        .await
        .unwrap();
    assert_eq!(again.updated_count, 0);
}

#[tokio::test]
async fn recalculate_ends_roles_the_office_no_longer_grants() {
    let fx = setup().await;
    let mut input = CreateOffice::new("Marshal", fx.department_id, 24);
    input.grants_role_id = Some(Uuid::new_v4());
    let office = fx.office(input).await;
    let member = fx.member("Percival", false).await;
    let officer = fx.assign(&office, &member, fx.barony).await;

    fx.offices()
        .update(
            office.id,
            UpdateOffice {
                grants_role_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    fx.service
        .recalculate_officers_for_office(office.id, fx.approver_id)
        .await
        .unwrap();

    let roles = SurrealMemberRoleRepository::new(fx.db.clone());
    let role = roles
        .get_by_id(officer.granted_member_role_id.unwrap())
        .await
        .unwrap();
    assert_eq!(role.status, WindowStatus::Released);
}

#[tokio::test]
async fn sync_statuses_expires_and_activates() {
    let fx = setup().await;
    let office = fx
        .office(CreateOffice::new("Chatelaine", fx.department_id, 0))
        .await;

    let lapsing = fx.member("Agnes", false).await;
    let mut request = fx.request(&office, &lapsing, fx.barony);
    request.end_on = Some(Utc::now() + Duration::days(1));
    let lapsing = fx.service.assign(request).await.unwrap();
    assert_eq!(lapsing.status, WindowStatus::Current);

    let starting = fx.member("Bertram", false).await;
    let mut request = fx.request(&office, &starting, fx.barony);
    request.start_on = Utc::now() + Duration::days(3);
    let starting = fx.service.assign(request).await.unwrap();
    assert_eq!(starting.status, WindowStatus::Upcoming);

    let summary = fx
        .service
        .sync_statuses(Utc::now() + Duration::days(5))
        .await
        .unwrap();
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.activated, 1);

    assert_eq!(summary.roles_expired, 0);
    assert_eq!(summary.roles_activated, 0);

    let officers = SurrealOfficerRepository::new(fx.db.clone());
    let lapsing = officers.get_by_id(lapsing.id).await.unwrap();
    let starting = officers.get_by_id(starting.id).await.unwrap();
    assert_eq!(lapsing.status, WindowStatus::Expired);
    assert_eq!(starting.status, WindowStatus::Current);
}

#[tokio::test]
async fn sync_statuses_moves_granted_roles_with_their_officers() {
    let fx = setup().await;
    let mut input = CreateOffice::new("Exchequer", fx.department_id, 0);
    input.grants_role_id = Some(Uuid::new_v4());
    let office = fx.office(input).await;

    let lapsing = fx.member("Agnes", false).await;
    let mut request = fx.request(&office, &lapsing, fx.barony);
    request.end_on = Some(Utc::now() + Duration::days(1));
    let lapsing = fx.service.assign(request).await.unwrap();

    let starting = fx.member("Bertram", false).await;
    let mut request = fx.request(&office, &starting, fx.region);
    request.start_on = Utc::now() + Duration::days(3);
    let starting = fx.service.assign(request).await.unwrap();

    let roles = SurrealMemberRoleRepository::new(fx.db.clone());
    let lapsing_role = lapsing.granted_member_role_id.unwrap();
    let starting_role = starting.granted_member_role_id.unwrap();
    assert_eq!(
        roles.get_by_id(lapsing_role).await.unwrap().status,
        WindowStatus::Current
    );
    assert_eq!(
        roles.get_by_id(starting_role).await.unwrap().status,
        WindowStatus::Upcoming
    );

    let summary = fx
        .service
        .sync_statuses(Utc::now() + Duration::days(5))
        .await
        .unwrap();
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.activated, 1);
    assert_eq!(summary.roles_expired, 1);
    assert_eq!(summary.roles_activated, 1);

    assert_eq!(
        roles.get_by_id(lapsing_role).await.unwrap().status,
        WindowStatus::Expired
    );
    assert_eq!(
        roles.get_by_id(starting_role).await.unwrap().status,
        WindowStatus::Current
    );
}
