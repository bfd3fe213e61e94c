//! Metrics emitted by upstream calls, retries and the discovery cache.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::time::Duration;

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assistarr::clients::ServiceClient;
use assistarr::{
    Assistarr, DiscoveryConfig, MemoryConfigStore, RetryConfig, ServiceConfig, ServiceName,
    UpstreamTimeouts, telemetry,
};

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum counter values matching `name` and, if given, a label value.
fn counter_total(snapshot: &SnapshotVec, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .filter(|(key, _, _, _)| match label {
            Some((k, v)) => key.key().labels().any(|l| l.key() == k && l.value() == v),
            None => true,
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

fn radarr_client(uri: &str, data_timeout: Duration) -> ServiceClient {
    ServiceClient::new(ServiceName::Radarr, reqwest::Client::new(), uri, "k").with_timeouts(
        UpstreamTimeouts {
            data: data_timeout,
            health: data_timeout,
        },
    )
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` keeps the sync `with_local_recorder` closure on the
/// current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn upstream_call_records_count_and_duration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/queue"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let client = radarr_client(&server.uri(), Duration::from_secs(5));
                assert!(client.get::<Value>("/api/v3/movie", &[]).await.is_ok());
                assert!(client.get::<Value>("/api/v3/queue", &[]).await.is_err());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    let name = telemetry::UPSTREAM_REQUESTS_TOTAL;
    assert_eq!(counter_total(&snapshot, name, None), 2);
    assert_eq!(counter_total(&snapshot, name, Some(("status", "ok"))), 1);
    assert_eq!(counter_total(&snapshot, name, Some(("status", "error"))), 1);
    assert_eq!(counter_total(&snapshot, name, Some(("service", "radarr"))), 2);
    assert!(
        has_histogram(&snapshot, telemetry::UPSTREAM_REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn timed_out_call_is_labelled_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let client = radarr_client(&server.uri(), Duration::from_millis(50));
                assert!(client.get::<Value>("/api/v3/movie", &[]).await.is_err());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::UPSTREAM_REQUESTS_TOTAL,
            Some(("status", "timeout"))
        ),
        1
    );
    assert_eq!(
        counter_total(
            &snapshot,
            telemetry::UPSTREAM_REQUESTS_TOTAL,
            Some(("status", "error"))
        ),
        0
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn refused_connection_is_labelled_error() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let client = radarr_client("http://127.0.0.1:1", Duration::from_secs(2));
                assert!(client.get::<Value>("/api/v3/movie", &[]).await.is_err());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    let name = telemetry::UPSTREAM_REQUESTS_TOTAL;
    assert_eq!(counter_total(&snapshot, name, Some(("status", "error"))), 1);
    assert_eq!(counter_total(&snapshot, name, Some(("status", "timeout"))), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn discovery_cache_miss_then_hit() {
    let jellyseerr = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/discover/trending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [
                {"mediaType": "movie", "id": 603, "title": "The Matrix"},
                {"mediaType": "movie", "id": 604, "title": "Reloaded"}
            ]
        })))
        .mount(&jellyseerr)
        .await;

    let assistarr = Assistarr::builder()
        .store(Arc::new(MemoryConfigStore::with_configs([ServiceConfig::new(
            "alice",
            ServiceName::Jellyseerr,
            jellyseerr.uri(),
            "k",
        )])))
        .discovery(DiscoveryConfig::new().capacity(4).target(2))
        .retry(RetryConfig::disabled())
        .build()
        .unwrap();

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                assistarr.for_you("alice").await.unwrap();
                assistarr.for_you("alice").await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::DISCOVERY_CACHE_MISSES_TOTAL, None), 1);
    assert_eq!(counter_total(&snapshot, telemetry::DISCOVERY_CACHE_HITS_TOTAL, None), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn transient_discovery_failure_records_retry() {
    let jellyseerr = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/discover/trending"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&jellyseerr)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/discover/trending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [{"mediaType": "movie", "id": 603, "title": "The Matrix"}]
        })))
        .mount(&jellyseerr)
        .await;

    let assistarr = Assistarr::builder()
        .store(Arc::new(MemoryConfigStore::with_configs([ServiceConfig::new(
            "alice",
            ServiceName::Jellyseerr,
            jellyseerr.uri(),
            "k",
        )])))
        .retry(
            RetryConfig::new()
                .max_attempts(2)
                .initial_delay(Duration::from_millis(10)),
        )
        .build()
        .unwrap();

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let section = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async { assistarr.for_you("alice").await })
        })
    })
    .unwrap();
    assert_eq!(section.items.len(), 1);

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_total(&snapshot, telemetry::RETRIES_TOTAL, Some(("operation", "trending"))),
        1
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // No recorder installed: calls must not panic.
    let server = MockServer::start().await;
    let client = radarr_client(&server.uri(), Duration::from_secs(1));
    let _ = client.get::<Value>("/missing", &[]).await;
}
