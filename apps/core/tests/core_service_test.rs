use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use searchfan_core::config::Config;
use searchfan_core::contract::{CoreRequest, CoreResponse, ListTargetsRequest};
use searchfan_core::core_service::{CoreService, ServiceError};
use searchfan_core::favicon::{FaviconFetcher, FetchError};
use searchfan_core::host::StaticAppRegistry;
use searchfan_core::icon_coordinator::{CoordinatorSettings, IconLoadCoordinator};
use searchfan_core::icon_resolver::IconResolver;
use searchfan_core::launcher::{LaunchError, UrlOpener};
use searchfan_core::model::{IconMode, IconOrigin, Target, TargetGroup};

struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct OfflineFetcher;

impl FaviconFetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::new(format!("offline: {url}")))
    }
}

fn test_coordinator(tag: &str) -> IconLoadCoordinator {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let resolver = Arc::new(IconResolver::new(
        Arc::new(StaticAppRegistry::empty()),
        Arc::new(OfflineFetcher),
    ));
    IconLoadCoordinator::new(
        resolver,
        CoordinatorSettings {
            memory_capacity: 8,
            icon_cache_dir: std::env::temp_dir().join(format!("searchfan-svc-{tag}-{unique}")),
            worker_count: 1,
            disk_budget_bytes: 0,
        },
    )
}

fn seeded_service(tag: &str) -> (CoreService, Arc<Mutex<Vec<String>>>) {
    let db = searchfan_core::target_store::open_memory().unwrap();
    let opened = Arc::new(Mutex::new(Vec::new()));
    let opener = RecordingOpener {
        opened: opened.clone(),
    };
    let service =
        CoreService::with_providers(Config::default(), db, test_coordinator(tag), Box::new(opener))
            .unwrap();

    service
        .upsert_group(&TargetGroup::new(1, "search", 0))
        .unwrap();
    service
        .upsert_target(&Target::new(
            10,
            1,
            "Example",
            "https://example.com/s?q=%s",
            "",
            IconMode::Resolved,
            "",
            0x336699ff,
            0,
        ))
        .unwrap();
    service
        .upsert_target(&Target::new(
            11,
            1,
            "Wiki",
            "https://wiki.example/w?search=%s",
            "",
            IconMode::Generated,
            "W",
            0x224488ff,
            1,
        ))
        .unwrap();

    (service, opened)
}

#[test]
fn open_group_opens_every_target_in_order() {
    let (service, opened) = seeded_service("open-order");

    let urls = service.open_group("search", "rust lang").unwrap();

    assert_eq!(
        urls,
        vec![
            "https://example.com/s?q=rust+lang".to_string(),
            "https://wiki.example/w?search=rust+lang".to_string(),
        ]
    );
    assert_eq!(opened.lock().unwrap().as_slice(), urls.as_slice());
}

#[test]
fn open_group_unknown_group_returns_typed_error() {
    let (service, _) = seeded_service("open-missing");

    let result = service.open_group("nope", "query");

    match result {
        Err(ServiceError::GroupNotFound(name)) => assert_eq!(name, "nope"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn open_group_skips_targets_that_fail_to_open() {
    let (service, opened) = seeded_service("open-skip");
    service
        .upsert_target(&Target::new(
            12,
            1,
            "Broken",
            "   ",
            "",
            IconMode::Generated,
            "",
            0x000000ff,
            2,
        ))
        .unwrap();

    let urls = service.open_group("search", "q").unwrap();

    assert_eq!(urls.len(), 2);
    assert_eq!(opened.lock().unwrap().len(), 2);
}

#[test]
fn refresh_icons_counts_fallbacks() {
    let (service, _) = seeded_service("refresh");

    let report = service.refresh_icons(false).unwrap();

    // The resolved target has no reachable source; the generated one
    // always succeeds.
    assert_eq!(report.refreshed, 2);
    assert_eq!(report.fallbacks, 1);
}

#[test]
fn icon_for_target_resolves_generated_badges() {
    let (service, _) = seeded_service("icon-generated");

    let artifact = service.icon_for_target(11, false).unwrap();

    assert_eq!(artifact.origin, IconOrigin::Generated);
}

#[test]
fn icon_for_missing_target_returns_typed_error() {
    let (service, _) = seeded_service("icon-missing");

    match service.icon_for_target(99, false) {
        Err(ServiceError::TargetNotFound(id)) => assert_eq!(id, 99),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn list_targets_command_reports_groups_in_order() {
    let (service, _) = seeded_service("list");

    let response = service
        .handle_command(CoreRequest::ListTargets(ListTargetsRequest {}))
        .unwrap();

    match response {
        CoreResponse::ListTargets(list) => {
            assert_eq!(list.groups.len(), 1);
            assert_eq!(list.groups[0].name, "search");
            let labels: Vec<&str> = list.groups[0]
                .targets
                .iter()
                .map(|target| target.label.as_str())
                .collect();
            assert_eq!(labels, vec!["Example", "Wiki"]);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}
