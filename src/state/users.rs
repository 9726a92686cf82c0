//! Admin user management.

use std::sync::Arc;

use super::collection::{Collection, Keyed, fetch_into};
use crate::error::ClientError;
use crate::net::api::{ApiClient, ApiRequest};
use crate::net::types::{AdminUserUpdate, Page, User};

pub const USERS_PAGE_SIZE: u32 = 200;

impl Keyed for User {
    fn key(&self) -> i64 {
        self.id
    }
}

pub struct UserStore {
    api: Arc<ApiClient>,
    users: Collection<User>,
}

impl UserStore {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api, users: Collection::new() }
    }

    pub async fn users(&self) -> Vec<User> {
        self.users.items().await
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.users.is_loading()
    }

    /// Forget every cached user.
    pub async fn reset(&self) {
        self.users.clear().await;
    }

    /// Replace the cached user list, sorted by full name.
    ///
    /// # Errors
    ///
    /// On failure the list is reset to empty, the error logged and returned.
    pub async fn fetch_all_users(&self) -> Result<Vec<User>, ClientError> {
        let request = ApiRequest::get("/users").query("size", USERS_PAGE_SIZE).query("sort", "fullName");
        fetch_into(&self.api, &self.users, request, "users", |page: Page<User>| page.content).await
    }

    /// # Errors
    ///
    /// Backend errors after logging.
    pub async fn fetch_user(&self, id: i64) -> Result<User, ClientError> {
        self.api
            .send_json(ApiRequest::get(format!("/users/{id}")))
            .await
            .inspect_err(|e| tracing::error!(error = %e, user_id = id, "failed to fetch user"))
    }

    /// Look a user up in the cache, fetching the list first if it is empty.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`ClientError::NotFound`].
    pub async fn find_user(&self, id: i64) -> Result<User, ClientError> {
        let found = if self.users.is_empty().await {
            self.fetch_all_users().await?.into_iter().find(|user| user.id == id)
        } else {
            self.users.get(id).await
        };
        found.ok_or(ClientError::NotFound { entity: "user", id })
    }

    /// Change a user's role and active flag; the cached entry is replaced
    /// once the backend confirms.
    ///
    /// # Errors
    ///
    /// Backend errors after logging; the cache is untouched.
    pub async fn update_user(&self, id: i64, update: AdminUserUpdate) -> Result<User, ClientError> {
        let _writes = self.users.lock_writes().await;
        let request = ApiRequest::put(format!("/users/{id}")).json(&update)?;
        let updated: User = self
            .api
            .send_json(request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, user_id = id, "failed to update user"))?;
        self.users.replace(updated.clone()).await;
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
