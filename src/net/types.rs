//! Wire types shared with the REST backend.
//!
//! Field names follow the backend's camelCase JSON. Plain rooms and admin
//! room entries (room + next booking) are separate types so each store
//! decodes exactly the shape its endpoint returns.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Timezone sent with profile updates when the user record carries none.
pub const DEFAULT_TIMEZONE: &str = "Asia/Bangkok";

// =============================================================================
// USERS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Member,
    /// Any role this client does not know about. Never treated as admin.
    #[serde(other)]
    Other,
}

/// A user account as returned by `/users/me` and the admin user list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// ROOMS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub equipments_json: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl Room {
    /// A missing or null `isActive` counts as inactive.
    #[must_use]
    pub fn active(&self) -> bool {
        self.is_active == Some(true)
    }
}

/// Row of `/rooms/admin-list`: a room plus its next confirmed booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRoomEntry {
    pub room: Room,
    #[serde(default)]
    pub next_booking: Option<Booking>,
}

/// Body for `POST /rooms` and `PUT /rooms/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInput {
    pub name: String,
    pub capacity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipments_json: Option<String>,
    pub is_active: bool,
}

// =============================================================================
// BOOKINGS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: BookingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub room: Option<Room>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Booking {
    #[must_use]
    pub fn room_id(&self) -> Option<i64> {
        self.room.as_ref().map(|room| room.id)
    }
}

/// Body for `POST /bookings`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreate {
    pub room_id: i64,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body for `PUT /bookings/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// =============================================================================
// AUTH + PROFILE BODIES
// =============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub is_admin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate<'a> {
    pub full_name: &'a str,
    pub timezone: &'a str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

/// Body for `PUT /users/{id}` (admin).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdate {
    pub role: Role,
    pub is_active: bool,
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Paginated list envelope. Only `content` is consumed.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: Option<u64>,
}

/// Backend error body: `{timestamp,status,error,message,path,validationErrors}`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub validation_errors: Vec<String>,
}

impl ErrorBody {
    /// Human-readable summary: message, then validation errors if any.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let head = self.message.clone().or_else(|| self.error.clone())?;
        if self.validation_errors.is_empty() {
            return Some(head);
        }
        Some(format!("{head} ({})", self.validation_errors.join("; ")))
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
