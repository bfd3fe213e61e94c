//! HTTP routes served by assistarrd.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use super::auth::AuthUser;
use super::error::{ApiError, ApiResult};
use crate::{
    Assistarr, AssistarrError, ConnectionTest, LookupQuery, MediaDetails, MediaRequestInput,
    MonitorSnapshot, RequestReceipt, Section, ServiceConfig, ServiceConfigInput, ServiceName,
    version_string,
};

type AppState = Arc<Assistarr>;

/// Build the API router over a shared [`Assistarr`].
pub fn router(assistarr: Arc<Assistarr>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/settings", get(list_settings).post(save_settings))
        .route("/api/settings/test", post(test_settings))
        .route("/api/settings/{service}", delete(delete_settings))
        .route("/api/status", get(status))
        .route("/api/discover", get(discover))
        .route("/api/discover/for-you", get(for_you))
        .route("/api/media/lookup", get(lookup))
        .route("/api/media/request", post(request_media))
        .with_state(assistarr)
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError(AssistarrError::InvalidInput(rejection.body_text()))
}

fn bad_query(rejection: QueryRejection) -> ApiError {
    ApiError(AssistarrError::InvalidInput(rejection.body_text()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": version_string() }))
}

async fn list_settings(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ServiceConfig>>> {
    Ok(Json(assistarr.list_settings(&user).await?))
}

async fn save_settings(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<ServiceConfigInput>, JsonRejection>,
) -> ApiResult<Json<ServiceConfig>> {
    let Json(input) = body.map_err(bad_body)?;
    Ok(Json(assistarr.save_settings(&user, input).await?))
}

async fn test_settings(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<ServiceConfigInput>, JsonRejection>,
) -> ApiResult<Json<ConnectionTest>> {
    let Json(input) = body.map_err(bad_body)?;
    Ok(Json(assistarr.test_connection(&user, input).await))
}

async fn delete_settings(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
    Path(service): Path<String>,
) -> ApiResult<StatusCode> {
    let service: ServiceName = service.parse()?;
    assistarr.delete_settings(&user, service).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn status(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<MonitorSnapshot>> {
    Ok(Json(assistarr.status_snapshot(&user).await?))
}

async fn discover(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let sections = assistarr.discover(&user).await?;
    Ok(Json(json!({ "sections": sections })))
}

async fn for_you(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Section>> {
    Ok(Json(assistarr.for_you(&user).await?))
}

async fn lookup(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> ApiResult<Json<MediaDetails>> {
    let Query(query) = query.map_err(bad_query)?;
    Ok(Json(assistarr.lookup(&user, &query).await?))
}

async fn request_media(
    State(assistarr): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<MediaRequestInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RequestReceipt>)> {
    let Json(input) = body.map_err(bad_body)?;
    let receipt = assistarr.request_media(&user, &input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
