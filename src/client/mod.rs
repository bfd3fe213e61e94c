//! Client library for talking to a running assistarrd.
//!
//! Provides [`DaemonClient`], which forwards calls to the daemon's JSON API
//! on behalf of one user.

mod daemon_client;

pub use daemon_client::DaemonClient;
