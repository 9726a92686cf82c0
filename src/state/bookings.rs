//! Booking store: "my bookings" and the admin "all bookings" view.
//!
//! The two lists are fetched independently and may overlap. Creates and
//! updates touch the cache only after the backend confirms; cancellation
//! removes the booking immediately and puts it back if the call fails.

use std::sync::Arc;

use time::OffsetDateTime;

use super::collection::{Collection, Keyed, fetch_into};
use crate::error::ClientError;
use crate::net::api::{ApiClient, ApiRequest};
use crate::net::types::{Booking, BookingCreate, BookingUpdate, Page};
use crate::validation;

pub const MY_BOOKINGS_PAGE_SIZE: u32 = 100;
pub const ALL_BOOKINGS_PAGE_SIZE: u32 = 100;

impl Keyed for Booking {
    fn key(&self) -> i64 {
        self.id
    }
}

pub struct BookingStore {
    api: Arc<ApiClient>,
    mine: Collection<Booking>,
    all: Collection<Booking>,
}

impl BookingStore {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api, mine: Collection::new(), all: Collection::new() }
    }

    pub async fn my_bookings(&self) -> Vec<Booking> {
        self.mine.items().await
    }

    pub async fn all_bookings(&self) -> Vec<Booking> {
        self.all.items().await
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.mine.is_loading() || self.all.is_loading()
    }

    /// Forget both booking lists.
    pub async fn reset(&self) {
        self.mine.clear().await;
        self.all.clear().await;
    }

    // =========================================================================
    // FETCH
    // =========================================================================

    /// Replace "my bookings" with the current user's bookings.
    ///
    /// # Errors
    ///
    /// On failure the list is reset to empty, the error logged and returned.
    pub async fn fetch_my_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        let request = ApiRequest::get("/bookings/my-bookings").query("size", MY_BOOKINGS_PAGE_SIZE);
        fetch_into(&self.api, &self.mine, request, "my bookings", |page: Page<Booking>| page.content).await
    }

    /// Replace "all bookings" (admin), newest start first.
    ///
    /// # Errors
    ///
    /// On failure the list is reset to empty, the error logged and returned.
    pub async fn fetch_all_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        let request = ApiRequest::get("/bookings/all")
            .query("size", ALL_BOOKINGS_PAGE_SIZE)
            .query("sort", "startAt,desc");
        fetch_into(&self.api, &self.all, request, "all bookings", |page: Page<Booking>| page.content).await
    }

    /// Look a booking up in "my bookings", fetching the list first if it is empty.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`ClientError::NotFound`].
    pub async fn find_booking(&self, id: i64) -> Result<Booking, ClientError> {
        let found = if self.mine.is_empty().await {
            self.fetch_my_bookings().await?.into_iter().find(|booking| booking.id == id)
        } else {
            self.mine.get(id).await
        };
        found.ok_or(ClientError::NotFound { entity: "booking", id })
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Create a booking and prepend it to "my bookings".
    ///
    /// # Errors
    ///
    /// Validation errors before sending; backend errors after logging. The
    /// cache is untouched on failure.
    pub async fn create_booking(&self, booking: BookingCreate) -> Result<Booking, ClientError> {
        validation::booking_create(&booking, OffsetDateTime::now_utc())?;
        let _writes = self.mine.lock_writes().await;

        let request = ApiRequest::post("/bookings").json(&booking)?;
        let created: Booking = self
            .api
            .send_json(request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to create booking"))?;
        self.mine.prepend(created.clone()).await;
        Ok(created)
    }

    /// Update a booking and replace it wherever it is cached.
    ///
    /// # Errors
    ///
    /// Validation errors before sending; backend errors after logging.
    pub async fn update_booking(&self, id: i64, update: BookingUpdate) -> Result<Booking, ClientError> {
        validation::booking_update(&update)?;
        let _mine = self.mine.lock_writes().await;
        let _all = self.all.lock_writes().await;

        let request = ApiRequest::put(format!("/bookings/{id}")).json(&update)?;
        let updated: Booking = self
            .api
            .send_json(request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, booking_id = id, "failed to update booking"))?;
        self.mine.replace(updated.clone()).await;
        self.all.replace(updated.clone()).await;
        Ok(updated)
    }

    /// Cancel a booking optimistically.
    ///
    /// The booking disappears from both lists before the request is sent and
    /// is restored at its old position if the backend rejects the cancel.
    ///
    /// # Errors
    ///
    /// Backend errors after logging and rollback.
    pub async fn cancel_booking(&self, id: i64) -> Result<(), ClientError> {
        let _mine = self.mine.lock_writes().await;
        let _all = self.all.lock_writes().await;

        let taken_mine = self.mine.take(id).await;
        let taken_all = self.all.take(id).await;

        match self.api.send(ApiRequest::delete(format!("/bookings/{id}"))).await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, booking_id = id, "failed to cancel booking; restoring");
                if let Some(removed) = taken_mine {
                    self.mine.restore(removed).await;
                }
                if let Some(removed) = taken_all {
                    self.all.restore(removed).await;
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "bookings_test.rs"]
mod tests;
