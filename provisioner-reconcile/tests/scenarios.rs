//! End-to-end pipeline runs against the in-memory Grafana.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use provisioner_core::{Config, OrgName, Uid};
use provisioner_grafana::fake::{InMemoryGrafana, Op};
use provisioner_grafana::{GrafanaApi, Permission, PermissionItem, Role};
use provisioner_reconcile::datasource::SECRET_HEADER_FIELD;
use provisioner_reconcile::{run, Outcome, ResourceKind, RunOptions};

fn team_a_config() -> Config {
    serde_json::from_value(json!({
        "organizations": [{ "name": "Team A" }],
        "dataSources": [{
            "uid": "ds-1",
            "name": "Loki",
            "type": "loki",
            "url": "http://loki:3100",
            "jsonData": { "httpHeaderName1": "X-Scope-OrgID" }
        }],
        "folders": [{ "uid": "fld-1", "title": "Services" }],
        "dashboards": [{
            "dashboard": { "uid": "home", "title": "Home", "panels": [] },
            "folderUid": "fld-1",
            "overwrite": false
        }]
    }))
    .expect("config")
}

fn options() -> RunOptions {
    RunOptions::default()
}

#[test]
fn team_a_is_fully_provisioned() {
    let grafana = InMemoryGrafana::new();
    let report = run(&grafana, &team_a_config(), &options());

    assert!(!report.has_failures(), "{report:#?}");
    let org = report.org("Team A").expect("org report");
    assert_eq!(org.outcome_of(ResourceKind::Organization, "Team A"), Some(&Outcome::Created));

    let team_a = grafana.org_id("Team A").expect("org exists");
    assert_eq!(org.org_id, Some(team_a));

    let secrets = grafana.data_source_secrets(team_a, "ds-1").expect("data source");
    assert_eq!(secrets.get(SECRET_HEADER_FIELD).map(String::as_str), Some("Team A"));

    assert_eq!(grafana.folder(team_a, "fld-1"), Some(("Services".to_owned(), 1)));
    assert_eq!(
        grafana.permissions(team_a, "fld-1"),
        vec![
            PermissionItem { role: Role::Admin, permission: Permission::Admin },
            PermissionItem { role: Role::Editor, permission: Permission::Edit },
        ]
    );

    assert_eq!(grafana.dashboard_count(team_a), 1);
    assert_eq!(grafana.home_dashboard(team_a), Some(Uid::from("home")));
}

#[test]
fn every_configured_org_resolves_after_a_run() {
    let grafana = InMemoryGrafana::new();
    let mut config = team_a_config();
    config.organizations.push(serde_json::from_value(json!({ "name": "Team B" })).unwrap());

    run(&grafana, &config, &options());

    for name in ["Team A", "Team B"] {
        let found = grafana
            .get_org_by_name(&OrgName::from(name))
            .expect("lookup")
            .expect("org present");
        assert_eq!(found.name, OrgName::from(name));
    }
}

#[test]
fn rerun_updates_without_duplicates() {
    let grafana = InMemoryGrafana::new();
    let config = team_a_config();
    run(&grafana, &config, &options());
    let orgs_after_first = grafana.org_count();

    let report = run(&grafana, &config, &options());
    let team_a = grafana.org_id("Team A").expect("org");

    assert_eq!(grafana.org_count(), orgs_after_first);
    assert_eq!(grafana.data_source_count(team_a), 1);
    assert_eq!(grafana.dashboard_count(team_a), 1);
    assert_eq!(report.created(), 0);
    assert!(!report.has_failures(), "{report:#?}");

    let org = report.org("Team A").expect("org report");
    assert_eq!(org.outcome_of(ResourceKind::Organization, "Team A"), Some(&Outcome::Unchanged));
    assert!(org.resources[1..].iter().all(|r| r.outcome == Outcome::Updated));
}

#[test]
fn folder_update_uses_version_from_preceding_lookup() {
    let grafana = InMemoryGrafana::new();
    let config = team_a_config();
    run(&grafana, &config, &options());
    let team_a = grafana.org_id("Team A").expect("org");
    grafana.seed_folder(team_a, "fld-1", "Renamed by hand", 9);

    let report = run(&grafana, &config, &options());

    let update = grafana.calls_to(Op::UpdateFolder).pop().expect("update");
    assert_eq!(update.org, team_a);
    assert_eq!(update.body.expect("body")["version"], json!(9));
    assert_eq!(
        report.org("Team A").and_then(|o| o.outcome_of(ResourceKind::Folder, "fld-1")),
        Some(&Outcome::Updated)
    );
}

#[test]
fn dashboard_version_follows_server() {
    let grafana = InMemoryGrafana::new();
    let mut config = team_a_config();
    config.dashboards[0].dashboard = serde_json::from_value(json!({
        "uid": "home", "title": "Home", "version": 42
    }))
    .unwrap();

    run(&grafana, &config, &options());
    let first = grafana.calls_to(Op::PostDashboard).pop().expect("first post");
    assert!(first.body.expect("body")["dashboard"].get("version").is_none());

    run(&grafana, &config, &options());
    let second = grafana.calls_to(Op::PostDashboard).pop().expect("second post");
    assert_eq!(second.body.expect("body")["dashboard"]["version"], json!(1));

    let team_a = grafana.org_id("Team A").expect("org");
    assert_eq!(grafana.dashboard(team_a, "home").and_then(|d| d.version()), Some(2));
}

#[test]
fn data_source_failure_does_not_stop_the_rest() {
    let grafana = InMemoryGrafana::new();
    let mut config = team_a_config();
    let mut second = config.data_sources[0].clone();
    second.uid = Uid::from("ds-2");
    config.data_sources.push(second);
    grafana.fail(Op::AddDataSource, "ds-1", 400);

    let report = run(&grafana, &config, &options());
    let org = report.org("Team A").expect("org report");

    assert!(org.outcome_of(ResourceKind::DataSource, "ds-1").is_some_and(Outcome::is_failure));
    assert_eq!(org.outcome_of(ResourceKind::DataSource, "ds-2"), Some(&Outcome::Created));
    assert_eq!(org.outcome_of(ResourceKind::Folder, "fld-1"), Some(&Outcome::Created));
    assert_eq!(org.outcome_of(ResourceKind::Dashboard, "home"), Some(&Outcome::Created));
    assert_eq!(report.failed(), 1);
}

// A folder that was never created also fails its permission update.
#[rstest]
#[case(Op::GetDataSource, "ds-1", Op::AddDataSource, 500, 1)]
#[case(Op::GetFolder, "fld-1", Op::CreateFolder, 403, 2)]
#[case(Op::GetDashboard, "home", Op::PostDashboard, 401, 1)]
fn failed_lookup_never_creates(
    #[case] lookup: Op,
    #[case] key: &str,
    #[case] create: Op,
    #[case] status: u16,
    #[case] failures: usize,
) {
    let grafana = InMemoryGrafana::new();
    grafana.fail(lookup, key, status);

    let report = run(&grafana, &team_a_config(), &options());

    assert!(grafana.calls_to(create).is_empty());
    assert_eq!(report.failed(), failures, "{report:#?}");
}

#[test]
fn folder_permissions_reapplied_after_failed_lookup() {
    let grafana = InMemoryGrafana::new();
    let config = team_a_config();
    run(&grafana, &config, &options());
    let team_a = grafana.org_id("Team A").expect("org");
    grafana.fail(Op::GetFolder, "fld-1", 500);
    let permission_calls = grafana.calls_to(Op::UpdateFolderPermissions).len();

    let report = run(&grafana, &config, &options());
    let org = report.org("Team A").expect("org report");

    assert!(org.outcome_of(ResourceKind::Folder, "fld-1").is_some_and(Outcome::is_failure));
    assert_eq!(
        org.outcome_of(ResourceKind::FolderPermissions, "fld-1"),
        Some(&Outcome::Updated)
    );
    let calls = grafana.calls_to(Op::UpdateFolderPermissions);
    assert_eq!(calls.len(), permission_calls + 1);
    assert_eq!(calls.last().map(|c| c.org), Some(team_a));
}

#[test]
fn home_preference_set_even_when_post_is_rejected() {
    let grafana = InMemoryGrafana::new();
    grafana.fail(Op::PostDashboard, "home", 412);

    let report = run(&grafana, &team_a_config(), &options());
    let org = report.org("Team A").expect("org report");
    let team_a = grafana.org_id("Team A").expect("org");

    assert!(org.outcome_of(ResourceKind::Dashboard, "home").is_some_and(Outcome::is_failure));
    assert_eq!(
        org.outcome_of(ResourceKind::HomeDashboard, "home"),
        Some(&Outcome::Updated)
    );
    assert_eq!(grafana.calls_to(Op::PatchOrgPreferences).len(), 1);
    assert_eq!(grafana.home_dashboard(team_a), Some(Uid::from("home")));
}

#[test]
fn failed_org_lookup_never_creates_the_org() {
    let grafana = InMemoryGrafana::new();
    grafana.take_down(Op::GetOrgByName);

    let report = run(&grafana, &team_a_config(), &options());

    assert!(grafana.calls_to(Op::CreateOrg).is_empty());
    assert!(!grafana.mutated());
    assert_eq!(report.failed(), 1);
}

#[rstest]
#[case::fresh_instance(false)]
#[case::already_provisioned(true)]
fn dry_run_never_mutates(#[case] provisioned: bool) {
    let grafana = InMemoryGrafana::new();
    let config = team_a_config();
    if provisioned {
        run(&grafana, &config, &options());
    }
    let calls_before = grafana.calls().len();

    let report = run(
        &grafana,
        &config,
        &RunOptions {
            dry_run: true,
            ..options()
        },
    );

    let new_calls = &grafana.calls()[calls_before..];
    assert!(new_calls.iter().all(|c| matches!(
        c.op,
        Op::GetOrgByName | Op::GetDataSource | Op::GetFolder | Op::GetDashboard
    )));
    assert!(!report.has_failures());

    let org = report.org("Team A").expect("org report");
    let expected = if provisioned { Outcome::WouldUpdate } else { Outcome::skipped("organization does not exist yet") };
    assert_eq!(org.outcome_of(ResourceKind::DataSource, "ds-1"), Some(&expected));
}

#[test]
fn stop_flag_prevents_later_organizations() {
    let grafana = InMemoryGrafana::new();
    let mut config = team_a_config();
    config.organizations.push(serde_json::from_value(json!({ "name": "Team B" })).unwrap());

    let report = run(
        &grafana,
        &config,
        &RunOptions {
            stop: Arc::new(AtomicBool::new(true)),
            ..options()
        },
    );

    assert!(report.interrupted);
    assert!(grafana.org_id("Team A").is_none());
    assert!(grafana.org_id("Team B").is_none());
}
