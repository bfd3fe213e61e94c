//! Authenticated, timeout-bound HTTP access to one upstream service.
//!
//! [`ServiceClient`] is the only place that talks to the network. It
//! appends paths to the configured base URL, injects the service's
//! credential, aborts the call once its timeout elapses and maps every
//! failure into the upstream error taxonomy:
//!
//! | Outcome                      | Error                               |
//! |------------------------------|-------------------------------------|
//! | connect/IO failure, timeout  | [`AssistarrError::Unreachable`]     |
//! | non-2xx status               | [`AssistarrError::Upstream`]        |
//! | body does not match `T`      | [`AssistarrError::Validation`]      |
//!
//! Unknown extra fields in a response are always tolerated. Deserializing
//! into `serde_json::Value` passes the payload through unchanged. The
//! client never retries.

use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::telemetry;
use crate::types::{AuthScheme, ServiceConfig, ServiceName, normalize_base_url};
use crate::{AssistarrError, Result};

/// Timeout for health probes.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for data calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call timeouts for upstream requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    /// Data calls (libraries, queues, discovery). Default: 30s.
    pub data: Duration,
    /// Health probes. Default: 5s.
    pub health: Duration,
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self {
            data: DEFAULT_TIMEOUT,
            health: HEALTH_TIMEOUT,
        }
    }
}

#[derive(Clone)]
enum Credential {
    Header { name: &'static str, value: String },
    Cookie(String),
    None,
}

/// A fully read HTTP reply.
pub(crate) struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// HTTP access to one service with one user's credential.
#[derive(Clone)]
pub struct ServiceClient {
    service: ServiceName,
    base_url: String,
    credential: Credential,
    http: Client,
    timeout: Duration,
    timeouts: UpstreamTimeouts,
}

impl ServiceClient {
    /// Create a client for `service` at `base_url`.
    ///
    /// For header-authenticated services `api_key` is sent on every call.
    /// Session-cookie services start without a credential; see
    /// [`with_session_cookie`](Self::with_session_cookie).
    pub fn new(
        service: ServiceName,
        http: Client,
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
    ) -> Self {
        let api_key = api_key.into();
        let credential = match service.auth() {
            AuthScheme::Header(_) if api_key.is_empty() => Credential::None,
            AuthScheme::Header(name) => Credential::Header {
                name,
                value: api_key,
            },
            AuthScheme::SessionCookie => Credential::None,
        };
        Self {
            service,
            base_url: normalize_base_url(base_url.as_ref()),
            credential,
            http,
            timeout: DEFAULT_TIMEOUT,
            timeouts: UpstreamTimeouts::default(),
        }
    }

    /// Create a client from a stored config.
    pub fn from_config(http: Client, config: &ServiceConfig) -> Self {
        Self::new(config.service_name, http, &config.base_url, config.api_key.clone())
    }

    /// Same client using `timeouts`; data calls get `timeouts.data`.
    pub fn with_timeouts(self, timeouts: UpstreamTimeouts) -> Self {
        Self {
            timeout: timeouts.data,
            timeouts,
            ..self
        }
    }

    /// Same client bounded by the health-probe timeout.
    pub fn for_health(&self) -> Self {
        Self {
            timeout: self.timeouts.health,
            ..self.clone()
        }
    }

    /// Same client sending `cookie` (e.g. `SID=abc`) instead of an API key.
    pub fn with_session_cookie(&self, cookie: impl Into<String>) -> Self {
        Self {
            credential: Credential::Cookie(cookie.into()),
            ..self.clone()
        }
    }

    pub fn service(&self) -> ServiceName {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` with query `params` and decode the JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let request = self.http.get(self.url(path)).query(params);
        let reply = self.execute(request).await?;
        self.decode(&reply.body)
    }

    /// GET `path` and return the body as text.
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let reply = self.execute(self.http.get(self.url(path))).await?;
        Ok(String::from_utf8_lossy(&reply.body).into_owned())
    }

    /// POST `body` as JSON to `path` and decode the JSON reply into `T`.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        let reply = self.execute(request).await?;
        self.decode(&reply.body)
    }

    /// POST a url-encoded form and return the raw reply.
    pub(crate) async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Reply> {
        let request = self
            .http
            .post(self.url(path))
            .header(reqwest::header::REFERER, self.base_url.as_str())
            .form(form);
        self.execute(request).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Credential::Header { name, value } => request.header(*name, value),
            Credential::Cookie(cookie) => request.header(reqwest::header::COOKIE, cookie),
            Credential::None => request,
        }
    }

    /// Send, read the whole body within the timeout and check the status.
    async fn execute(&self, request: RequestBuilder) -> Result<Reply> {
        let request = self.authorize(request);
        let start = Instant::now();

        let outcome = tokio::time::timeout(self.timeout, async {
            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?.to_vec();
            Ok::<_, reqwest::Error>(Reply {
                status,
                headers,
                body,
            })
        })
        .await;

        metrics::histogram!(telemetry::UPSTREAM_REQUEST_DURATION_SECONDS,
            "service" => self.service.as_str(),
        )
        .record(start.elapsed().as_secs_f64());

        let (result, status) = match outcome {
            Err(_) => (
                Err(AssistarrError::Unreachable {
                    service: self.service,
                    message: format!("timed out after {}s", self.timeout.as_secs_f64()),
                }),
                "timeout",
            ),
            Ok(Err(e)) => (
                Err(AssistarrError::Unreachable {
                    service: self.service,
                    message: e.without_url().to_string(),
                }),
                "error",
            ),
            Ok(Ok(reply)) if !reply.status.is_success() => (
                Err(AssistarrError::Upstream {
                    service: self.service,
                    status: reply.status.as_u16(),
                    message: upstream_message(reply.status, &reply.body),
                }),
                "error",
            ),
            Ok(Ok(reply)) => (Ok(reply), "ok"),
        };

        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "service" => self.service.as_str(),
            "status" => status,
        )
        .increment(1);
        if let Err(e) = &result {
            debug!(service = %self.service, error = %e, "upstream call failed");
        }
        result
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T> {
        serde_json::from_slice(body).map_err(|e| AssistarrError::Validation {
            service: self.service,
            message: e.to_string(),
        })
    }
}

/// Prefer the service's own `message`/`error` field, else the reason phrase.
fn upstream_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string())
}
