//! Room store: active rooms, time-filtered availability, and the admin list.
//!
//! The admin list decodes a different shape (room + next booking) than the
//! plain room endpoints, so it lives in its own collection of
//! [`AdminRoomEntry`] rows keyed by the room id.

use std::sync::Arc;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::collection::{Collection, Keyed, fetch_into};
use crate::error::ClientError;
use crate::net::api::{ApiClient, ApiRequest};
use crate::net::types::{AdminRoomEntry, Page, Room, RoomInput};
use crate::validation::{self, ValidationError};

pub const ROOMS_PAGE_SIZE: u32 = 100;

impl Keyed for Room {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for AdminRoomEntry {
    fn key(&self) -> i64 {
        self.room.id
    }
}

pub struct RoomStore {
    api: Arc<ApiClient>,
    active: Collection<Room>,
    available: Collection<Room>,
    admin: Collection<AdminRoomEntry>,
}

impl RoomStore {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api, active: Collection::new(), available: Collection::new(), admin: Collection::new() }
    }

    /// Active rooms, sorted by name as the backend returned them.
    pub async fn all_rooms(&self) -> Vec<Room> {
        self.active.items().await
    }

    /// Result of the last availability query.
    pub async fn available_rooms(&self) -> Vec<Room> {
        self.available.items().await
    }

    pub async fn admin_rooms(&self) -> Vec<AdminRoomEntry> {
        self.admin.items().await
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.active.is_loading() || self.available.is_loading() || self.admin.is_loading()
    }

    pub async fn reset(&self) {
        self.active.clear().await;
        self.available.clear().await;
        self.admin.clear().await;
    }

    // =========================================================================
    // FETCH
    // =========================================================================

    /// Replace the active-room cache. Inactive rooms are filtered out here,
    /// not by the backend.
    ///
    /// # Errors
    ///
    /// On failure the cache is reset to empty, the error logged and returned.
    pub async fn fetch_all_rooms(&self) -> Result<Vec<Room>, ClientError> {
        let request = ApiRequest::get("/rooms").query("size", ROOMS_PAGE_SIZE).query("sort", "name");
        fetch_into(&self.api, &self.active, request, "rooms", |page: Page<Room>| {
            page.content.into_iter().filter(Room::active).collect()
        })
        .await
    }

    /// Rooms free for the whole `[start_at, end_at)` window.
    ///
    /// The previous result is cleared before the request goes out.
    ///
    /// # Errors
    ///
    /// Validation error if the window is empty or reversed; otherwise the
    /// result is reset to empty and the error logged and returned.
    pub async fn fetch_available_rooms(
        &self,
        start_at: OffsetDateTime,
        end_at: OffsetDateTime,
    ) -> Result<Vec<Room>, ClientError> {
        if end_at <= start_at {
            return Err(ValidationError::new("endAt", "End time must be after start time").into());
        }
        self.available.clear().await;
        let request = ApiRequest::get("/rooms/available")
            .query("startAt", start_at.format(&Rfc3339)?)
            .query("endAt", end_at.format(&Rfc3339)?);
        fetch_into(&self.api, &self.available, request, "available rooms", |rooms: Vec<Room>| rooms).await
    }

    /// Replace the admin list (every room, active or not, with its next booking).
    ///
    /// # Errors
    ///
    /// On failure the list is reset to empty, the error logged and returned.
    pub async fn fetch_admin_rooms(&self) -> Result<Vec<AdminRoomEntry>, ClientError> {
        let request = ApiRequest::get("/rooms/admin-list");
        fetch_into(&self.api, &self.admin, request, "admin rooms", |rows: Vec<AdminRoomEntry>| rows).await
    }

    /// Fetch one room from the backend. The caches are not touched.
    ///
    /// # Errors
    ///
    /// Backend errors after logging.
    pub async fn fetch_room(&self, id: i64) -> Result<Room, ClientError> {
        self.api
            .send_json(ApiRequest::get(format!("/rooms/{id}")))
            .await
            .inspect_err(|e| tracing::error!(error = %e, room_id = id, "failed to fetch room"))
    }

    /// Look a room up in the active cache, fetching it first if empty.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`ClientError::NotFound`].
    pub async fn find_room(&self, id: i64) -> Result<Room, ClientError> {
        let found = if self.active.is_empty().await {
            self.fetch_all_rooms().await?.into_iter().find(|room| room.id == id)
        } else {
            self.active.get(id).await
        };
        found.ok_or(ClientError::NotFound { entity: "room", id })
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// # Errors
    ///
    /// Validation errors before sending; backend errors after logging. The
    /// caches are untouched on failure.
    pub async fn create_room(&self, input: RoomInput) -> Result<Room, ClientError> {
        validation::room(&input)?;
        let _admin = self.admin.lock_writes().await;
        let _active = self.active.lock_writes().await;

        let request = ApiRequest::post("/rooms").json(&input)?;
        let created: Room = self
            .api
            .send_json(request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to create room"))?;

        self.admin.upsert(AdminRoomEntry { room: created.clone(), next_booking: None }).await;
        if created.active() {
            self.active.upsert(created.clone()).await;
        }
        tracing::info!(room_id = created.id, "room created");
        Ok(created)
    }

    /// Update a room. The admin entry keeps its next booking; the active
    /// cache gains or loses the room according to its new state.
    ///
    /// # Errors
    ///
    /// Validation errors before sending; backend errors after logging.
    pub async fn update_room(&self, id: i64, input: RoomInput) -> Result<Room, ClientError> {
        validation::room(&input)?;
        let _admin = self.admin.lock_writes().await;
        let _active = self.active.lock_writes().await;

        let request = ApiRequest::put(format!("/rooms/{id}")).json(&input)?;
        let updated: Room = self
            .api
            .send_json(request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, room_id = id, "failed to update room"))?;

        let room = updated.clone();
        self.admin
            .mutate(move |rows| {
                if let Some(row) = rows.iter_mut().find(|row| row.room.id == room.id) {
                    row.room = room.clone();
                }
            })
            .await;
        if updated.active() {
            self.active.upsert(updated.clone()).await;
        } else {
            self.active.remove(updated.id).await;
        }
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
