mod common;

use camino::{Utf8Path, Utf8PathBuf};
use common::{stub_registry, StubProvider};
use mod_sync_lib::core::manifest_store::Records;
use mod_sync_lib::core::planner::UpdatePlanner;
use mod_sync_lib::models::credentials::Credentials;
use mod_sync_lib::models::mod_spec::{ModKey, ModSpec, Provider};
use mod_sync_lib::models::record::InstalledRecord;
use serde_json::json;

fn spec(mod_id: &str, version: Option<&str>) -> ModSpec {
    ModSpec {
        provider: Provider::Thunderstore,
        app: "acme".to_string(),
        mod_id: mod_id.to_string(),
        version: version.map(String::from),
        install_dir: None,
    }
}

fn installed(mod_id: &str, version: &str) -> InstalledRecord {
    InstalledRecord {
        provider: Provider::Thunderstore,
        app: "acme".to_string(),
        mod_id: mod_id.to_string(),
        version: version.to_string(),
        manifest: json!({ "name": mod_id }),
        install_dir: Utf8PathBuf::from("/srv/mods"),
        dependencies: Vec::new(),
        installed_at: 1,
    }
}

fn records(list: Vec<InstalledRecord>) -> Records {
    list.into_iter().map(|r| (r.key(), r)).collect()
}

struct Fixture {
    thunderstore: std::sync::Arc<StubProvider>,
    registry: mod_sync_lib::core::registry::ProviderRegistry,
    credentials: Credentials,
}

fn fixture() -> Fixture {
    let thunderstore = StubProvider::new(Provider::Thunderstore);
    let registry = stub_registry(
        thunderstore.clone(),
        StubProvider::new(Provider::Nexusmods),
        StubProvider::new(Provider::Workshop),
    );
    Fixture {
        thunderstore,
        registry,
        credentials: Credentials::default(),
    }
}

#[tokio::test]
async fn pinned_and_installed_skips_the_provider() {
    let f = fixture();
    let planner = UpdatePlanner::new(&f.registry, &f.credentials, Utf8Path::new("/srv/mods"));

    let plan = planner
        .plan(&[spec("widget", Some("2.1.0"))], &records(vec![installed("widget", "2.1.0")]))
        .await;

    assert_eq!(f.thunderstore.calls(), 0);
    assert_eq!(plan.entries.len(), 1);
    assert!(!plan.entries[0].need_update);
    assert_eq!(plan.entries[0].resolved.version, "2.1.0");
}

#[tokio::test]
async fn no_record_needs_update() {
    let f = fixture();
    f.thunderstore.answer("widget", "2.1.0", Some("http://localhost/widget.zip".into()));
    let planner = UpdatePlanner::new(&f.registry, &f.credentials, Utf8Path::new("/srv/mods"));

    let plan = planner.plan(&[spec("widget", None)], &Records::new()).await;

    let entry = &plan.entries[0];
    assert!(entry.need_update);
    assert_eq!(entry.previous_version, None);
    assert_eq!(entry.resolved.install_dir, Utf8PathBuf::from("/srv/mods"));
    assert_eq!(plan.diff.only_declared, vec![ModKey::new(Provider::Thunderstore, "acme", "widget")]);
}

#[tokio::test]
async fn latest_equal_to_installed_is_up_to_date() {
    let f = fixture();
    f.thunderstore.answer("widget", "2.1.0", Some("http://localhost/widget.zip".into()));
    let planner = UpdatePlanner::new(&f.registry, &f.credentials, Utf8Path::new("/srv/mods"));

    let plan = planner
        .plan(&[spec("widget", None)], &records(vec![installed("widget", "2.1.0")]))
        .await;

    assert_eq!(f.thunderstore.calls(), 1);
    assert!(!plan.entries[0].need_update);
    assert_eq!(plan.up_to_date(), 1);
    assert!(plan.diff.version_changed.is_empty());
}

#[tokio::test]
async fn newer_latest_is_an_update() {
    let f = fixture();
    f.thunderstore.answer("widget", "2.2.0", Some("http://localhost/widget.zip".into()));
    let planner = UpdatePlanner::new(&f.registry, &f.credentials, Utf8Path::new("/srv/mods"));

    let plan = planner
        .plan(&[spec("widget", None)], &records(vec![installed("widget", "2.1.0")]))
        .await;

    let entry = &plan.entries[0];
    assert!(entry.need_update);
    assert_eq!(entry.previous_version.as_deref(), Some("2.1.0"));
    assert_eq!(entry.to_string(), "thunderstore/acme/widget: update 2.1.0 -> 2.2.0");
    assert_eq!(plan.diff.version_changed, vec![entry.key()]);
}

#[tokio::test]
async fn resolution_failure_only_drops_that_spec() {
    let f = fixture();
    f.thunderstore.answer("widget", "2.1.0", Some("http://localhost/widget.zip".into()));
    let planner = UpdatePlanner::new(&f.registry, &f.credentials, Utf8Path::new("/srv/mods"));

    let plan = planner
        .plan(&[spec("missing", None), spec("widget", None)], &Records::new())
        .await;

    assert_eq!(plan.entries.len(), 1);
    assert_eq!(plan.entries[0].resolved.mod_id, "widget");
    assert_eq!(plan.failures.len(), 1);
    assert_eq!(plan.failures[0].key.mod_id, "missing");
}

#[tokio::test]
async fn undeclared_records_are_orphaned() {
    let f = fixture();
    f.thunderstore.answer("widget", "2.1.0", Some("http://localhost/widget.zip".into()));
    let planner = UpdatePlanner::new(&f.registry, &f.credentials, Utf8Path::new("/srv/mods"));

    let plan = planner
        .plan(
            &[spec("widget", None)],
            &records(vec![installed("widget", "2.1.0"), installed("retired", "0.9.0")]),
        )
        .await;

    assert_eq!(
        plan.diff.only_installed,
        vec![ModKey::new(Provider::Thunderstore, "acme", "retired")]
    );
    assert!(plan.entries.iter().all(|e| e.resolved.mod_id != "retired"));
}

#[tokio::test]
async fn first_duplicate_declaration_wins() {
    let f = fixture();
    let planner = UpdatePlanner::new(&f.registry, &f.credentials, Utf8Path::new("/srv/mods"));

    let plan = planner
        .plan(
            &[spec("widget", Some("2.1.0")), spec("widget", Some("3.0.0"))],
            &records(vec![installed("widget", "2.1.0")]),
        )
        .await;

    assert_eq!(plan.entries.len(), 1);
    assert!(!plan.entries[0].need_update);
    assert_eq!(f.thunderstore.calls(), 0);
}
