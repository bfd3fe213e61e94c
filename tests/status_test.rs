//! Status snapshot aggregation against mocked services.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assistarr::{
    Assistarr, MemoryConfigStore, ServiceConfig, ServiceName, ServiceStatus, UpstreamTimeouts,
};

const USER: &str = "alice";

fn assistarr(configs: Vec<ServiceConfig>) -> Assistarr {
    Assistarr::builder()
        .store(Arc::new(MemoryConfigStore::with_configs(configs)))
        .timeouts(UpstreamTimeouts {
            data: Duration::from_secs(2),
            health: Duration::from_millis(300),
        })
        .build()
        .unwrap()
}

async fn healthy(server: &MockServer, health_path: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(health_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn failing(server: &MockServer, health_path: &str) {
    Mock::given(method("GET"))
        .and(path(health_path))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn failing_radarr_and_unconfigured_sonarr() {
    let radarr = MockServer::start().await;
    failing(&radarr, "/api/v3/system/status").await;

    let assistarr = assistarr(vec![ServiceConfig::new(
        USER,
        ServiceName::Radarr,
        radarr.uri(),
        "k",
    )]);
    let snapshot = assistarr.status_snapshot(USER).await.unwrap();

    let radarr_status = &snapshot.services[&ServiceName::Radarr];
    assert!(radarr_status.configured);
    assert!(radarr_status.enabled);
    assert!(!radarr_status.online);
    assert!(radarr_status.error.as_deref().unwrap().contains("500"));

    assert_eq!(
        snapshot.services[&ServiceName::Sonarr],
        ServiceStatus::not_configured()
    );
    assert_eq!(snapshot.services.len(), ServiceName::ALL.len());
}

#[tokio::test]
async fn n_configured_m_failing() {
    let radarr = MockServer::start().await;
    healthy(&radarr, "/api/v3/system/status", json!({"version": "5.2.6"})).await;
    let sonarr = MockServer::start().await;
    failing(&sonarr, "/api/v3/system/status").await;
    let jellyfin = MockServer::start().await;
    healthy(&jellyfin, "/System/Info", json!({"Version": "10.9.1"})).await;
    let portainer = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"Version": "2.19"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&portainer)
        .await;

    let assistarr = assistarr(vec![
        ServiceConfig::new(USER, ServiceName::Radarr, radarr.uri(), "k"),
        ServiceConfig::new(USER, ServiceName::Sonarr, sonarr.uri(), "k"),
        ServiceConfig::new(USER, ServiceName::Jellyfin, jellyfin.uri(), "k"),
        ServiceConfig::new(USER, ServiceName::Portainer, portainer.uri(), "k"),
    ]);
    let snapshot = assistarr.status_snapshot(USER).await.unwrap();

    assert_eq!(snapshot.configured_count(), 4);
    assert_eq!(snapshot.offline_count(), 2);
    assert!(snapshot.services[&ServiceName::Radarr].online);
    assert_eq!(
        snapshot.services[&ServiceName::Jellyfin].version.as_deref(),
        Some("10.9.1")
    );
    assert!(snapshot.services[&ServiceName::Sonarr].is_offline());
    let portainer_error = snapshot.services[&ServiceName::Portainer].error.clone().unwrap();
    assert!(portainer_error.contains("timed out"), "{portainer_error}");
}

#[tokio::test]
async fn disabled_service_is_not_called() {
    let radarr = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "5"})))
        .expect(0)
        .mount(&radarr)
        .await;

    let assistarr = assistarr(vec![
        ServiceConfig::new(USER, ServiceName::Radarr, radarr.uri(), "k").enabled(false),
    ]);
    let snapshot = assistarr.status_snapshot(USER).await.unwrap();

    assert_eq!(snapshot.services[&ServiceName::Radarr], ServiceStatus::disabled());
    assert_eq!(snapshot.offline_count(), 0);
}

#[tokio::test]
async fn listings_are_collected_and_failures_do_not_mark_offline() {
    let radarr = MockServer::start().await;
    healthy(&radarr, "/api/v3/system/status", json!({"version": "5.2.6"})).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": 1, "title": "Heat", "status": "downloading",
                         "size": 100.0, "sizeleft": 50.0}]
        })))
        .mount(&radarr)
        .await;

    let jellyseerr = MockServer::start().await;
    healthy(&jellyseerr, "/api/v1/status", json!({"version": "1.9.2"})).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/request"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&jellyseerr)
        .await;

    let assistarr = assistarr(vec![
        ServiceConfig::new(USER, ServiceName::Radarr, radarr.uri(), "k"),
        ServiceConfig::new(USER, ServiceName::Jellyseerr, jellyseerr.uri(), "k"),
    ]);
    let snapshot = assistarr.status_snapshot(USER).await.unwrap();

    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(snapshot.queue[0].title, "Heat");
    assert!(snapshot.pending_requests.is_empty());
    assert!(snapshot.services[&ServiceName::Jellyseerr].online);
    assert_eq!(snapshot.offline_count(), 0);
}

#[tokio::test]
async fn other_users_configs_are_not_used() {
    let radarr = MockServer::start().await;
    healthy(&radarr, "/api/v3/system/status", json!({"version": "5"})).await;

    let assistarr = assistarr(vec![ServiceConfig::new(
        "bob",
        ServiceName::Radarr,
        radarr.uri(),
        "k",
    )]);
    let snapshot = assistarr.status_snapshot(USER).await.unwrap();
    assert_eq!(snapshot.configured_count(), 0);
}

#[tokio::test]
async fn hung_service_does_not_hold_snapshot_past_health_timeout() {
    let radarr = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"version": "5", "records": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&radarr)
        .await;

    let assistarr = Assistarr::builder()
        .store(Arc::new(MemoryConfigStore::with_configs([ServiceConfig::new(
            USER,
            ServiceName::Radarr,
            radarr.uri(),
            "k",
        )])))
        .timeouts(UpstreamTimeouts {
            data: Duration::from_secs(4),
            health: Duration::from_millis(300),
        })
        .build()
        .unwrap();

    let started = Instant::now();
    let snapshot = assistarr.status_snapshot(USER).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(2), "snapshot took {elapsed:?}");
    assert!(snapshot.services[&ServiceName::Radarr].is_offline());
    assert!(snapshot.queue.is_empty());
}

#[tokio::test]
async fn qbittorrent_logs_in_once_per_snapshot() {
    let qbit = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "SID=abc123; HttpOnly; path=/")
                .set_body_string("Ok."),
        )
        .expect(1)
        .mount(&qbit)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/app/version"))
        .and(header("cookie", "SID=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v4.6.2"))
        .mount(&qbit)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/info"))
        .and(header("cookie", "SID=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "ubuntu.iso", "state": "stalledDL", "progress": 0.5},
            {"name": "debian.iso", "state": "uploading", "progress": 1.0}
        ])))
        .mount(&qbit)
        .await;

    let assistarr = assistarr(vec![ServiceConfig::new(
        USER,
        ServiceName::Qbittorrent,
        qbit.uri(),
        "admin:pw",
    )]);
    let snapshot = assistarr.status_snapshot(USER).await.unwrap();

    let status = &snapshot.services[&ServiceName::Qbittorrent];
    assert!(status.online);
    assert_eq!(status.version.as_deref(), Some("v4.6.2"));
    assert_eq!(snapshot.stalled.len(), 1);
    assert_eq!(snapshot.stalled[0].title, "ubuntu.iso");
}

#[tokio::test]
async fn qbittorrent_rejected_login_is_offline() {
    let qbit = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Fails."))
        .expect(1)
        .mount(&qbit)
        .await;

    let assistarr = assistarr(vec![ServiceConfig::new(
        USER,
        ServiceName::Qbittorrent,
        qbit.uri(),
        "admin:wrong",
    )]);
    let snapshot = assistarr.status_snapshot(USER).await.unwrap();

    assert!(snapshot.services[&ServiceName::Qbittorrent].is_offline());
    assert!(snapshot.stalled.is_empty());
}
