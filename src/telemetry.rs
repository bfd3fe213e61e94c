//! Telemetry metric name constants.
//!
//! Centralised metric names for assistarr operations. The daemon or an
//! embedding application installs its own `metrics` recorder; without one,
//! all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `assistarr_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `service`: upstream service name (e.g. "radarr", "jellyseerr")
//! - `operation`: logical call (e.g. "health", "queue", "trending")
//! - `status`: outcome: "ok", "error" or "timeout"

/// Total HTTP requests sent to upstream services.
///
/// Labels: `service`, `status` ("ok" | "error" | "timeout").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "assistarr_upstream_requests_total";

/// Upstream request duration in seconds, including body download.
///
/// Labels: `service`.
pub const UPSTREAM_REQUEST_DURATION_SECONDS: &str = "assistarr_upstream_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `service`, `operation`.
pub const RETRIES_TOTAL: &str = "assistarr_retries_total";

/// Per-user discovery cache lookups that found existing state.
pub const DISCOVERY_CACHE_HITS_TOTAL: &str = "assistarr_discovery_cache_hits_total";

/// Per-user discovery cache lookups that started from an empty state.
pub const DISCOVERY_CACHE_MISSES_TOTAL: &str = "assistarr_discovery_cache_misses_total";
