//! End-to-end worker behavior: lifecycle, fetch interception, control
//! messages, and maintenance, all against a scripted network.

use std::time::Duration;

use mortar_cache::{CacheStorage, FetchRequest, Method, StoredResponse};
use mortar_worker::{
    testing::MockNet, ControlEnvelope, Phase, SweepTrigger, Worker, WorkerConfig,
};
use rstest::rstest;
use serde_json::json;
use url::Url;

const BASE: &str = "https://catalog.example.com/";
const PARTS_CSV: &str = "https://catalog.example.com/Data/parts.csv";

fn config() -> WorkerConfig {
    WorkerConfig::new(Url::parse(BASE).unwrap())
}

fn worker_with(config: WorkerConfig, net: MockNet) -> (Worker<MockNet>, CacheStorage) {
    let storage = CacheStorage::new();
    (Worker::new(config, storage.clone(), net), storage)
}

fn get(url: &str) -> FetchRequest {
    FetchRequest::get(Url::parse(url).unwrap())
}

fn navigate(url: &str) -> FetchRequest {
    FetchRequest::navigate(Url::parse(url).unwrap())
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn install_precaches_what_it_can_and_requests_activation() {
    let net = MockNet::new();
    net.respond(BASE, StoredResponse::ok("<html>root</html>"));
    net.respond(
        "https://catalog.example.com/index.html",
        StoredResponse::ok("<html>shell</html>"),
    );
    // Every other shell asset stays unscripted and fails.
    let (worker, storage) = worker_with(config(), net);

    worker.install().await;

    assert_eq!(worker.phase(), Phase::Installed);
    assert!(worker.skip_waiting_requested());
    let cache = storage.open("catalog-cache-v1");
    assert_eq!(cache.len(), 2);
    assert!(cache
        .match_key("https://catalog.example.com/index.html")
        .is_some());
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn navigation_offline_serves_cached_shell() {
    let net = MockNet::new();
    net.respond(BASE, StoredResponse::ok("<html>root shell</html>"));
    let (worker, _storage) = worker_with(config(), net);
    worker.install().await;
    worker.activate().await;

    // An uncached page, network down.
    let resp = worker
        .handle_fetch(&navigate("https://catalog.example.com/collection"))
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_string(), "<html>root shell</html>");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn navigation_with_nothing_cached_yields_offline_page() {
    let (worker, _storage) = worker_with(config(), MockNet::new());
    worker.activate().await;

    let resp = worker
        .handle_fetch(&navigate("https://catalog.example.com/collection"))
        .await
        .unwrap();

    assert_eq!(resp.status, 503);
    assert_eq!(
        resp.headers.get("content-type"),
        Some("text/html; charset=utf-8")
    );
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn csv_cold_fetch_stores_then_serves_stale_when_offline() {
    let net = MockNet::new();
    net.respond(PARTS_CSV, StoredResponse::ok("id,name\n3001,Brick"));
    let (worker, _storage) = worker_with(config(), net);
    worker.activate().await;

    let first = worker.handle_fetch(&get(PARTS_CSV)).await.unwrap();
    assert_eq!(first.body_string(), "id,name\n3001,Brick");

    let cache = worker.active_cache().await;
    assert!(cache.match_key(PARTS_CSV).is_some());
    worker.settle().await;

    // Second request is served from cache; revalidation runs detached.
    let second = worker.handle_fetch(&get(PARTS_CSV)).await.unwrap();
    assert_eq!(second.body_string(), "id,name\n3001,Brick");
    worker.settle().await;
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn non_get_requests_pass_through() {
    let (worker, _storage) = worker_with(config(), MockNet::new());
    worker.activate().await;

    let request = get(PARTS_CSV).with_method(Method::Post);
    assert!(worker.handle_fetch(&request).await.is_none());
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn direct_reference_api_bypass_is_opt_in() {
    let direct = "https://rebrickable.com/api/v3/lego/colors/?page=1";
    let proxied = "https://corsproxy.io/?https://rebrickable.com/api/v3/lego/colors/";

    let mut bypassing = config();
    bypassing.policy.bypass_direct_api = true;
    let net = MockNet::new();
    net.respond(proxied, StoredResponse::ok("{}"));
    let (worker, _storage) = worker_with(bypassing, net);
    worker.activate().await;

    // Direct calls fall through to the platform; proxied ones stay handled.
    assert!(worker.handle_fetch(&get(direct)).await.is_none());
    assert!(worker.handle_fetch(&get(proxied)).await.is_some());
    worker.settle().await;

    // Default config intercepts direct calls too.
    let net = MockNet::new();
    net.respond(direct, StoredResponse::ok("{}"));
    let (worker, _storage) = worker_with(config(), net);
    worker.activate().await;
    assert!(worker.handle_fetch(&get(direct)).await.is_some());
    worker.settle().await;
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn activation_evicts_only_own_stale_namespaces() {
    let storage = CacheStorage::new();
    storage
        .open("catalog-cache-v0")
        .put_key(BASE, StoredResponse::ok("old"));
    storage
        .open("unrelated-app-v9")
        .put_key(BASE, StoredResponse::ok("foreign"));
    let worker = Worker::new(config(), storage.clone(), MockNet::new());
    let mut reloads = worker.subscribe();

    worker.activate().await;

    assert_eq!(worker.phase(), Phase::Activated);
    let names = storage.names();
    assert!(!names.contains(&"catalog-cache-v0".to_string()));
    assert!(names.contains(&"catalog-cache-v1".to_string()));
    assert!(names.contains(&"unrelated-app-v9".to_string()));
    assert_eq!(
        reloads.recv().await.unwrap(),
        mortar_worker::ClientMessage::ReloadPage
    );
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn get_version_replies_exactly_once() {
    let (worker, _storage) = worker_with(config(), MockNet::new());

    let (envelope, rx) = ControlEnvelope::with_reply(json!({"type":"GET_VERSION"}));
    worker.handle_message(envelope).await;

    let reply = rx.await.unwrap();
    assert_eq!(reply, json!({"type":"VERSION","version":"1"}));
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn get_version_info_wraps_version_in_data() {
    let (worker, _storage) = worker_with(config(), MockNet::new());

    let (envelope, rx) = ControlEnvelope::with_reply(json!({"type":"GET_VERSION_INFO"}));
    worker.handle_message(envelope).await;

    let reply = rx.await.unwrap();
    assert_eq!(
        reply,
        json!({"type":"VERSION_INFO_RESPONSE","data":{"version":"1"}})
    );
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn skip_waiting_message_flips_the_flag() {
    let (worker, _storage) = worker_with(config(), MockNet::new());
    assert!(!worker.skip_waiting_requested());

    worker
        .handle_message(ControlEnvelope::new(json!({"type":"SKIP_WAITING"})))
        .await;

    assert!(worker.skip_waiting_requested());
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn unknown_control_messages_are_ignored() {
    let (worker, _storage) = worker_with(config(), MockNet::new());

    worker
        .handle_message(ControlEnvelope::new(json!({"type":"PURGE_EVERYTHING"})))
        .await;
    worker.handle_message(ControlEnvelope::new(json!(42))).await;
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn csv_refresh_overwrites_cached_files_and_is_idempotent() {
    let net = MockNet::new();
    net.respond(PARTS_CSV, StoredResponse::ok("fresh"));
    let (worker, _storage) = worker_with(config(), net);
    worker.activate().await;
    let cache = worker.active_cache().await;
    cache.put_key(PARTS_CSV, StoredResponse::ok("stale"));
    cache.put_key(BASE, StoredResponse::ok("<html>shell</html>"));

    let refresh = || worker.handle_message(ControlEnvelope::new(json!({"type":"REFRESH_CSV_CACHE"})));
    refresh().await;
    refresh().await;

    assert_eq!(cache.match_key(PARTS_CSV).unwrap().body_string(), "fresh");
    // The non-CSV entry is untouched.
    assert_eq!(
        cache.match_key(BASE).unwrap().body_string(),
        "<html>shell</html>"
    );
    assert_eq!(cache.len(), 2);
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn minifig_refresh_drops_stale_figures_and_reprimes() {
    let net = MockNet::new();
    for i in 1..=28 {
        net.respond(
            &format!("https://catalog.example.com/Minifig_png/fig-{i}.png"),
            StoredResponse::ok(format!("fig-{i}")),
        );
    }
    let (worker, _storage) = worker_with(config(), net);
    worker.activate().await;
    let cache = worker.active_cache().await;
    cache.put_key(
        "https://catalog.example.com/Minifig_png/fig-999.png",
        StoredResponse::ok("stale"),
    );

    worker
        .handle_message(ControlEnvelope::new(json!({"type":"REFRESH_MINIFIG_CACHE"})))
        .await;

    assert!(cache
        .match_key("https://catalog.example.com/Minifig_png/fig-999.png")
        .is_none());
    assert_eq!(
        cache
            .match_key("https://catalog.example.com/Minifig_png/fig-7.png")
            .unwrap()
            .body_string(),
        "fig-7"
    );
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn api_refresh_re_fetches_reference_api_entries_with_no_store() {
    let colors = "https://rebrickable.com/api/v3/lego/colors/?page=1";
    let net = MockNet::new();
    net.respond(colors, StoredResponse::ok("fresh colors"));
    let (worker, _storage) = worker_with(config(), net);
    worker.activate().await;
    let cache = worker.active_cache().await;
    cache.put_key(colors, StoredResponse::ok("stale colors"));
    cache.put_key(PARTS_CSV, StoredResponse::ok("csv"));

    worker
        .handle_message(ControlEnvelope::new(json!({"type":"REFRESH_API_CACHE"})))
        .await;

    assert_eq!(
        cache.match_key(colors).unwrap().body_string(),
        "fresh colors"
    );
    assert_eq!(cache.match_key(PARTS_CSV).unwrap().body_string(), "csv");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn image_fetch_triggers_sweep_down_to_ceiling() {
    let mut config = config();
    config.policy.sweep = SweepTrigger::Always;
    config.policy.image_cache_ceiling = 3;
    let net = MockNet::new();
    let new_image = "https://catalog.example.com/photos/new.png";
    net.respond(new_image, StoredResponse::ok("png"));
    let (worker, _storage) = worker_with(config, net);
    worker.activate().await;

    let cache = worker.active_cache().await;
    for i in 0..4 {
        cache.put_key(
            &format!("https://catalog.example.com/photos/{i}.png"),
            StoredResponse::ok("png"),
        );
    }

    let resp = worker.handle_fetch(&get(new_image)).await.unwrap();
    assert_eq!(resp.status, 200);
    worker.settle().await;

    let remaining: Vec<String> = cache
        .keys()
        .into_iter()
        .filter(|k| k.ends_with(".png"))
        .collect();
    assert_eq!(remaining.len(), 3);
    // Oldest seeded images went first; the fresh fetch survives.
    assert!(remaining.contains(&new_image.to_string()));
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn image_cache_hit_does_not_trigger_a_sweep() {
    let mut config = config();
    config.policy.sweep = SweepTrigger::Always;
    config.policy.image_cache_ceiling = 1;
    let (worker, _storage) = worker_with(config, MockNet::new());
    worker.activate().await;

    let cache = worker.active_cache().await;
    let cached = "https://catalog.example.com/photos/cached.png";
    cache.put_key(cached, StoredResponse::ok("png"));
    cache.put_key(
        "https://catalog.example.com/photos/extra.png",
        StoredResponse::ok("png"),
    );

    // Pure hit: nothing stored, so even an always-firing trigger stays idle.
    let resp = worker.handle_fetch(&get(cached)).await.unwrap();
    assert_eq!(resp.status, 200);
    worker.settle().await;

    assert_eq!(cache.len(), 2, "a hit must not run the sweep");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn shutdown_stops_new_background_sweeps() {
    let mut config = config();
    config.policy.sweep = SweepTrigger::Always;
    config.policy.image_cache_ceiling = 0;
    let net = MockNet::new();
    let image = "https://catalog.example.com/photos/solo.png";
    net.respond(image, StoredResponse::ok("png"));
    let (worker, _storage) = worker_with(config, net);
    worker.activate().await;
    worker.shutdown();

    // The fetch itself still resolves; only the detached sweep is skipped.
    let resp = worker.handle_fetch(&get(image)).await.unwrap();
    assert_eq!(resp.status, 200);
    let cache = worker.active_cache().await;
    assert!(cache.match_key(image).is_some());
}
