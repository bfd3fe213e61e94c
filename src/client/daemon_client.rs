//! [`DaemonClient`]: HTTP client for the assistarrd API.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::USER_HEADER;
use crate::{
    AssistarrError, ConnectionTest, LookupQuery, MediaDetails, MediaRequestInput,
    MonitorSnapshot, Result, Section, ServiceConfig, ServiceConfigInput, ServiceName,
};

/// Calls assistarrd as a single user.
///
/// Error responses are mapped back onto [`AssistarrError`] by status code,
/// carrying the daemon's `error` message.
#[derive(Clone)]
pub struct DaemonClient {
    http: Client,
    base_url: String,
    user: String,
}

impl DaemonClient {
    /// # Example
    ///
    /// ```ignore
    /// let client = DaemonClient::new("http://127.0.0.1:7474", "alice")?;
    /// let snapshot = client.status().await?;
    /// ```
    pub fn new(base_url: impl AsRef<str>, user: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("assistarr-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AssistarrError::Daemon(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: crate::types::normalize_base_url(base_url.as_ref()),
            user: user.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/health`; needs no user.
    pub async fn health(&self) -> Result<Value> {
        self.send(self.http.get(format!("{}/api/health", self.base_url)))
            .await
    }

    pub async fn status(&self) -> Result<MonitorSnapshot> {
        self.send(self.request(Method::GET, "/api/status")).await
    }

    pub async fn discover(&self) -> Result<Vec<Section>> {
        let body: Value = self.send(self.request(Method::GET, "/api/discover")).await?;
        serde_json::from_value(body.get("sections").cloned().unwrap_or(Value::Null))
            .map_err(Into::into)
    }

    pub async fn for_you(&self) -> Result<Section> {
        self.send(self.request(Method::GET, "/api/discover/for-you"))
            .await
    }

    pub async fn list_settings(&self) -> Result<Vec<ServiceConfig>> {
        self.send(self.request(Method::GET, "/api/settings")).await
    }

    pub async fn save_settings(&self, input: &ServiceConfigInput) -> Result<ServiceConfig> {
        self.send_json(Method::POST, "/api/settings", input).await
    }

    pub async fn test_settings(&self, input: &ServiceConfigInput) -> Result<ConnectionTest> {
        self.send_json(Method::POST, "/api/settings/test", input)
            .await
    }

    pub async fn delete_settings(&self, service: ServiceName) -> Result<()> {
        let path = format!("/api/settings/{service}");
        self.dispatch(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    pub async fn lookup(&self, query: &LookupQuery) -> Result<MediaDetails> {
        self.send(self.request(Method::GET, "/api/media/lookup").query(query))
            .await
    }

    /// `POST /api/media/request`. Returns the daemon's receipt as JSON.
    pub async fn request_media(&self, input: &MediaRequestInput) -> Result<Value> {
        self.send_json(Method::POST, "/api/media/request", input)
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header(USER_HEADER, &self.user)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(self.request(method, path).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.dispatch(request).await?;
        response
            .json()
            .await
            .map_err(|e| AssistarrError::Daemon(format!("invalid response body: {e}")))
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AssistarrError::Daemon(format!("{}: {e}", self.base_url)))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("error").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| status.to_string());
        Err(from_status(status, message))
    }
}

/// Map a daemon error response onto the matching error kind.
fn from_status(status: StatusCode, message: String) -> AssistarrError {
    match status {
        StatusCode::UNAUTHORIZED => AssistarrError::Unauthenticated,
        StatusCode::BAD_REQUEST => AssistarrError::InvalidInput(message),
        StatusCode::NOT_FOUND => AssistarrError::NotFound(message),
        StatusCode::CONFLICT => AssistarrError::Conflict(message),
        _ => AssistarrError::Daemon(format!("HTTP {}: {message}", status.as_u16())),
    }
}
