//! Authenticated session: state, persistence, and actions.
//!
//! ARCHITECTURE
//! ============
//! [`SessionContext`] owns the token/user pair and the durable `authToken` /
//! `authUser` entries. It is constructed once and injected into the API
//! client (credential + teardown interceptors) and the router (guard input).
//! [`SessionStore`] holds the backend-facing actions: login, register,
//! logout, profile and password updates.
//!
//! INVARIANTS
//! ==========
//! - `is_logged_in()` iff a token is present; `is_admin()` iff the user's role is ADMIN.
//! - Durable storage is written while the in-memory write lock is held, so no
//!   reader observes memory and storage disagreeing. The outgoing credential
//!   is read from the same state, so it changes in the same step.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::ClientError;
use crate::net::api::{ApiClient, ApiRequest};
use crate::net::types::{
    ChangePassword, DEFAULT_TIMEZONE, LoginRequest, ProfileUpdate, RegisterRequest, TokenResponse, User,
};
use crate::router::{ENTRY_ROUTE, LANDING_ROUTE, Location, Navigator, Router};
use crate::storage::{Storage, TOKEN_KEY, USER_KEY};
use crate::validation;

// =============================================================================
// SESSION SNAPSHOT
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

pub struct SessionContext {
    session: RwLock<Session>,
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
}

impl SessionContext {
    /// Empty (logged-out) session.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session: RwLock::new(Session::default()), storage, navigator }
    }

    /// Rebuild the session from durable storage.
    ///
    /// An unreadable or corrupt `authUser` entry is dropped; the token is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the token entry cannot be read.
    pub fn restore(storage: Arc<dyn Storage>, navigator: Arc<dyn Navigator>) -> Result<Self, ClientError> {
        let token = storage.get_item(TOKEN_KEY)?;
        let user = match storage.get_item(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding corrupt persisted user");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "persisted user unreadable");
                None
            }
        };
        Ok(Self { session: RwLock::new(Session { token, user }), storage, navigator })
    }

    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.session.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.session.read().await.user.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_logged_in()
    }

    pub async fn is_admin(&self) -> bool {
        self.session.read().await.is_admin()
    }

    /// Install a new token and user in memory and durable storage together.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written; the session is unchanged.
    pub async fn commit(&self, token: String, user: User) -> Result<(), ClientError> {
        let raw_user = serde_json::to_string(&user)?;
        let mut session = self.session.write().await;
        self.storage.set_items(&[(TOKEN_KEY, token.as_str()), (USER_KEY, raw_user.as_str())])?;
        *session = Session { token: Some(token), user: Some(user) };
        Ok(())
    }

    /// Replace the current user record, keeping the token.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written; the session is unchanged.
    pub async fn replace_user(&self, user: User) -> Result<(), ClientError> {
        let raw_user = serde_json::to_string(&user)?;
        let mut session = self.session.write().await;
        self.storage.set_item(USER_KEY, &raw_user)?;
        session.user = Some(user);
        Ok(())
    }

    /// Clear memory and durable entries, then navigate to the entry view.
    /// Safe to call when already logged out.
    pub async fn teardown(&self) {
        {
            let mut session = self.session.write().await;
            if let Err(e) = self.storage.remove_items(&[TOKEN_KEY, USER_KEY]) {
                tracing::warn!(error = %e, "failed to clear persisted session");
            }
            *session = Session::default();
        }
        self.navigator.navigate(Location::of(ENTRY_ROUTE));
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

pub struct SessionStore {
    api: Arc<ApiClient>,
    router: Arc<Router>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, router: Arc<Router>) -> Self {
        Self { api, router }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<SessionContext> {
        self.api.session()
    }

    /// Exchange credentials for a token, load the profile, and commit both.
    ///
    /// Navigates to the remembered return path, or the landing view.
    ///
    /// # Errors
    ///
    /// Propagates validation, backend, and storage errors after logging them.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        validation::login(email, password)?;
        let request = ApiRequest::post("/auth/login").json(&LoginRequest { email, password })?;
        match self.authenticate(request).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "logged in");
                Ok(user)
            }
            Err(e) => {
                tracing::error!(error = %e, "login failed");
                Err(e)
            }
        }
    }

    /// Create an account and complete the session exactly like [`Self::login`].
    ///
    /// # Errors
    ///
    /// Propagates validation, backend, and storage errors after logging them.
    pub async fn register(&self, full_name: &str, email: &str, password: &str) -> Result<User, ClientError> {
        validation::registration(full_name, email, password)?;
        let body = RegisterRequest { full_name, email, password, is_admin: false };
        let request = ApiRequest::post("/auth/register").json(&body)?;
        match self.authenticate(request).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "registered");
                Ok(user)
            }
            Err(e) => {
                tracing::error!(error = %e, "register failed");
                Err(e)
            }
        }
    }

    async fn authenticate(&self, request: ApiRequest) -> Result<User, ClientError> {
        let token: TokenResponse = self.api.send_json(request).await?;
        let user: User = self
            .api
            .send_json(ApiRequest::get("/users/me").bearer(&token.access_token))
            .await?;
        self.context().commit(token.access_token, user.clone()).await?;

        let target = self
            .router
            .take_return_path()
            .or_else(|| LANDING_ROUTE.path().map(str::to_owned))
            .unwrap_or_else(|| "/".to_owned());
        self.router.navigate(&target).await;
        Ok(user)
    }

    /// End the session. Idempotent.
    pub async fn logout(&self) {
        self.context().teardown().await;
        tracing::info!("logged out");
    }

    /// Update the display name, keeping the stored timezone.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] without a user, or propagates
    /// validation/backend errors; the session is unchanged on failure.
    pub async fn update_profile(&self, full_name: &str) -> Result<User, ClientError> {
        validation::required(full_name, "Full name")?;
        validation::max_length(full_name, 255, "Full name")?;
        let current = self.context().user().await.ok_or(ClientError::NotAuthenticated)?;
        let timezone = current.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);

        let request = ApiRequest::put("/users/me").json(&ProfileUpdate { full_name, timezone })?;
        let updated: User = self
            .api
            .send_json(request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "update profile failed"))?;
        self.context().replace_user(updated.clone()).await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Propagates validation and backend errors after logging them.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<(), ClientError> {
        validation::required(old_password, "Current password")?;
        validation::password(new_password)?;
        let request = ApiRequest::put("/users/me/change-password").json(&ChangePassword { old_password, new_password })?;
        self.api
            .send(request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "change password failed"))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
