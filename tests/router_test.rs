//! HTTP routes exercised in-process with `tower::ServiceExt::oneshot`.

#![cfg(feature = "server")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assistarr::server::{USER_HEADER, router};
use assistarr::{Assistarr, MemoryConfigStore, ServiceConfig, ServiceName};

const USER: &str = "alice";

fn app(configs: Vec<ServiceConfig>) -> axum::Router {
    let assistarr = Assistarr::builder()
        .store(Arc::new(MemoryConfigStore::with_configs(configs)))
        .build()
        .unwrap();
    router(Arc::new(assistarr))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(USER_HEADER, USER)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(USER_HEADER, USER)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_needs_no_user() {
    let response = app(Vec::new())
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().unwrap().starts_with(assistarr::PKG_VERSION));
}

#[tokio::test]
async fn missing_or_blank_user_is_401() {
    let response = app(Vec::new())
        .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "authentication required");

    let response = app(Vec::new())
        .oneshot(
            Request::builder()
                .uri("/api/settings")
                .header(USER_HEADER, "   ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_lists_every_service() {
    let response = app(Vec::new()).oneshot(get("/api/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let services = body["services"].as_object().unwrap();
    assert_eq!(services.len(), ServiceName::ALL.len());
    assert_eq!(body["services"]["sonarr"]["configured"], false);
}

#[tokio::test]
async fn settings_roundtrip_masks_key() {
    let app = app(Vec::new());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/settings",
            json!({"serviceName": "radarr", "baseUrl": "http://radarr:7878/", "apiKey": "secret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let saved = json_body(response).await;
    assert_eq!(saved["apiKey"], assistarr::API_KEY_MASK);
    assert_eq!(saved["baseUrl"], "http://radarr:7878");

    let listed = json_body(app.clone().oneshot(get("/api/settings")).await.unwrap()).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/settings/radarr")
                .header(USER_HEADER, USER)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_service_in_path_is_400() {
    let response = app(Vec::new())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/settings/plex")
                .header(USER_HEADER, USER)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_400_json() {
    let response = app(Vec::new())
        .oneshot(post_json("/api/settings", json!({"serviceName": "radarr"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn request_without_jellyseerr_is_503() {
    let response = app(Vec::new())
        .oneshot(post_json(
            "/api/media/request",
            json!({"tmdbId": 603, "mediaType": "movie"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "jellyseerr is not configured");
}

#[tokio::test]
async fn available_title_request_is_409() {
    let jellyseerr = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/movie/603"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 603, "title": "The Matrix", "mediaInfo": {"status": 5}
        })))
        .mount(&jellyseerr)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/request"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&jellyseerr)
        .await;

    let response = app(vec![ServiceConfig::new(
        USER,
        ServiceName::Jellyseerr,
        jellyseerr.uri(),
        "k",
    )])
    .oneshot(post_json(
        "/api/media/request",
        json!({"tmdbId": 603, "mediaType": "movie"}),
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(response).await["error"],
        "The Matrix is already available"
    );
}

#[tokio::test]
async fn lookup_query_is_parsed() {
    let jellyseerr = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tv/1396"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1396, "name": "Breaking Bad"
        })))
        .mount(&jellyseerr)
        .await;

    let app = app(vec![ServiceConfig::new(
        USER,
        ServiceName::Jellyseerr,
        jellyseerr.uri(),
        "k",
    )]);
    let response = app
        .clone()
        .oneshot(get("/api/media/lookup?tmdbId=1396&mediaType=tv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["title"], "Breaking Bad");

    let response = app
        .oneshot(get("/api/media/lookup?tmdbId=abc&mediaType=tv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn discover_wraps_sections() {
    let response = app(Vec::new()).oneshot(get("/api/discover")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["sections"].as_array().unwrap().len(), 4);

    let response = app(Vec::new())
        .oneshot(get("/api/discover/for-you"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["id"], "for-you");
}
