//! # meetroom-client
//!
//! Client-side state layer for the meeting-room booking service.
//!
//! This crate holds the authenticated session, the shared HTTP client with
//! its credential/authorization interceptors, the navigation guard, and the
//! cached domain stores (bookings, rooms, users) backed by the REST API.
//! The `meetroom` binary drives the same stores from the command line.
//!
//! DEPENDENCY ORDER
//! ================
//! `net` (transport + API client) -> `state::session` -> `router` ->
//! `state::{bookings, rooms, users}`. [`app::App`] wires them together.

pub mod app;
pub mod config;
pub mod error;
pub mod net;
pub mod router;
pub mod state;
pub mod storage;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use app::App;
pub use config::ClientConfig;
pub use error::{ClientError, ErrorCode};
