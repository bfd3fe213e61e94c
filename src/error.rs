//! Assistarr error types

use crate::types::ServiceName;

/// Assistarr error types
#[derive(Debug, thiserror::Error)]
pub enum AssistarrError {
    // Upstream/network errors
    /// Network failure, connection refused or timeout.
    #[error("{service} is unreachable: {message}")]
    Unreachable {
        service: ServiceName,
        message: String,
    },

    /// The service answered with a non-2xx status.
    #[error("{service} returned HTTP {status}: {message}")]
    Upstream {
        service: ServiceName,
        status: u16,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response from {service}: {message}")]
    Validation {
        service: ServiceName,
        message: String,
    },

    // Configuration errors
    #[error("{0} is not configured")]
    NotConfigured(ServiceName),

    #[error("{0} is disabled")]
    ServiceDisabled(ServiceName),

    /// None of the services able to answer a request is configured.
    #[error("no service configured for {0}")]
    NoService(&'static str),

    #[error("configuration error: {0}")]
    Configuration(String),

    // Caller errors
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(String),

    /// Failure talking to a remote assistarrd (CLI client side).
    #[error("assistarrd request failed: {0}")]
    Daemon(String),
}

impl AssistarrError {
    /// Whether a repeated attempt could plausibly succeed.
    ///
    /// Network failures, 429 and 5xx responses are transient. Everything
    /// else (auth, validation, configuration, conflicts) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable { .. } => true,
            Self::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The upstream service this error originated from, if any.
    pub fn service(&self) -> Option<ServiceName> {
        match self {
            Self::Unreachable { service, .. }
            | Self::Upstream { service, .. }
            | Self::Validation { service, .. } => Some(*service),
            Self::NotConfigured(service) | Self::ServiceDisabled(service) => Some(*service),
            _ => None,
        }
    }

    /// Whether this error means "service not usable for this user", as
    /// opposed to a failed call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured(_) | Self::ServiceDisabled(_) | Self::NoService(_)
        )
    }

    /// HTTP status code for caller-facing endpoints.
    ///
    /// Upstream failures that reach a caller are reported as 500; the
    /// aggregators convert them into inline status instead.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::NotConfigured(_) | Self::ServiceDisabled(_) | Self::NoService(_) => 503,
            _ => 500,
        }
    }
}

/// Result type alias for Assistarr operations
pub type Result<T> = std::result::Result<T, AssistarrError>;
