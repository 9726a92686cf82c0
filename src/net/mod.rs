//! Network layer: wire types, the transport seam, and the shared API client.

pub mod api;
pub mod transport;
pub mod types;
