//! Client-side state modules.
//!
//! DESIGN
//! ======
//! State is split by domain (`session`, `bookings`, `rooms`, `users`) so each
//! store is the only writer of its own collections. Cached lists share the
//! [`collection::Collection`] container, which serializes mutations and drops
//! stale fetch results.

pub mod bookings;
pub mod collection;
pub mod rooms;
pub mod session;
pub mod users;
