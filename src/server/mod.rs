//! HTTP daemon surface.
//!
//! This module provides:
//! - The axum router over a shared [`Assistarr`](crate::Assistarr) (`routes`)
//! - Caller identity extraction (`auth`)
//! - JSON error rendering (`error`)
//! - Daemon configuration (`config`)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

pub use auth::{AuthUser, USER_HEADER};
pub use error::ApiError;
pub use routes::router;
