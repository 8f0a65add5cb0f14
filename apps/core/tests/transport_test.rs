use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use searchfan_core::config::Config;
use searchfan_core::contract::{CoreRequest, OpenGroupRequest};
use searchfan_core::core_service::CoreService;
use searchfan_core::favicon::{FaviconFetcher, FetchError};
use searchfan_core::host::StaticAppRegistry;
use searchfan_core::icon_coordinator::{CoordinatorSettings, IconLoadCoordinator};
use searchfan_core::icon_resolver::IconResolver;
use searchfan_core::launcher::{LaunchError, UrlOpener};
use searchfan_core::model::{IconMode, Target, TargetGroup};
use searchfan_core::transport::{handle_json, handle_request, ErrorCode, TransportResponse};

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

fn service_with_seed_targets(tag: &str) -> CoreService {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let resolver = Arc::new(IconResolver::new(
        Arc::new(StaticAppRegistry::empty()),
        Arc::new(OfflineFetcher),
    ));
    let icons = IconLoadCoordinator::new(
        resolver,
        CoordinatorSettings {
            memory_capacity: 8,
            icon_cache_dir: std::env::temp_dir().join(format!("searchfan-tx-{tag}-{unique}")),
            worker_count: 1,
            disk_budget_bytes: 0,
        },
    );
    let opener = RecordingOpener {
        opened: Arc::new(Mutex::new(Vec::new())),
    };
    let db = searchfan_core::target_store::open_memory().unwrap();
    let service = CoreService::with_providers(Config::default(), db, icons, Box::new(opener)).unwrap();

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
            IconMode::Generated,
            "E",
            0x336699ff,
            0,
        ))
        .unwrap();
    service
}

#[test]
fn request_handler_returns_ok_transport_response() {
    let service = service_with_seed_targets("ok");

    let response = handle_request(
        &service,
        CoreRequest::OpenGroup(OpenGroupRequest {
            group: "search".into(),
            query: "rust".into(),
        }),
    );

    match response {
        TransportResponse::Ok { response } => {
            let encoded = serde_json::to_string(&TransportResponse::Ok { response }).unwrap();
            assert!(encoded.contains("\"status\":\"ok\""));
            assert!(encoded.contains("https://example.com/s?q=rust"));
        }
        _ => panic!("expected ok transport response"),
    }
}

#[test]
fn json_handler_round_trips_a_list_request() {
    let service = service_with_seed_targets("list");

    let raw = handle_json(&service, "{\"kind\":\"ListTargets\",\"payload\":{}}");
    let parsed: TransportResponse = serde_json::from_str(&raw).unwrap();

    match parsed {
        TransportResponse::Ok { response } => {
            let encoded = serde_json::to_string(&response).unwrap();
            assert!(encoded.contains("\"name\":\"search\""));
            assert!(encoded.contains("\"label\":\"Example\""));
        }
        _ => panic!("expected ok transport response"),
    }
}

#[test]
fn json_handler_returns_invalid_json_error_code() {
    let service = service_with_seed_targets("badjson");

    let raw = handle_json(&service, "{not-json");
    let parsed: TransportResponse = serde_json::from_str(&raw).unwrap();

    match parsed {
        TransportResponse::Err { error } => assert_eq!(error.code, ErrorCode::InvalidJson),
        _ => panic!("expected invalid json error"),
    }
}

#[test]
fn json_handler_returns_group_not_found_error_code() {
    let service = service_with_seed_targets("missing-group");
    let request = CoreRequest::OpenGroup(OpenGroupRequest {
        group: "absent".into(),
        query: "q".into(),
    });

    let raw = handle_json(&service, &serde_json::to_string(&request).unwrap());
    let parsed: TransportResponse = serde_json::from_str(&raw).unwrap();

    match parsed {
        TransportResponse::Err { error } => {
            assert_eq!(error.code, ErrorCode::GroupNotFound);
            assert_eq!(error.message, "absent");
        }
        _ => panic!("expected group not found error"),
    }
}
