//! Application wiring.
//!
//! [`App`] builds the dependency graph once: storage and navigation history
//! feed the session context, which is shared by the API client and the
//! router; the stores hold the API client.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::net::api::ApiClient;
use crate::net::transport::{ReqwestTransport, Transport};
use crate::router::{History, Router};
use crate::state::bookings::BookingStore;
use crate::state::rooms::RoomStore;
use crate::state::session::{SessionContext, SessionStore};
use crate::state::users::UserStore;
use crate::storage::{FileStorage, Storage};

pub struct App {
    pub history: Arc<History>,
    pub api: Arc<ApiClient>,
    pub router: Arc<Router>,
    pub session: SessionStore,
    pub bookings: BookingStore,
    pub rooms: RoomStore,
    pub users: UserStore,
}

impl App {
    /// Production wiring: file-backed session storage and a reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file is unreadable or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let storage = FileStorage::open(config.state_file.clone())?;
        let transport = ReqwestTransport::new(config)?;
        tracing::debug!(base_url = %config.api_base_url, state_file = %config.state_file.display(), "client configured");
        Self::assemble(Arc::new(transport), Arc::new(storage))
    }

    /// Wire the graph around an arbitrary transport and storage, restoring
    /// any persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted token cannot be read.
    pub fn assemble(transport: Arc<dyn Transport>, storage: Arc<dyn Storage>) -> Result<Self, ClientError> {
        let history = Arc::new(History::new());
        let context = Arc::new(SessionContext::restore(storage, history.clone())?);
        let api = Arc::new(ApiClient::new(transport, context.clone()));
        let router = Arc::new(Router::new(context, history.clone()));

        Ok(Self {
            session: SessionStore::new(api.clone(), router.clone()),
            bookings: BookingStore::new(api.clone()),
            rooms: RoomStore::new(api.clone()),
            users: UserStore::new(api.clone()),
            history,
            api,
            router,
        })
    }

    #[must_use]
    pub fn context(&self) -> &Arc<SessionContext> {
        self.api.session()
    }

    /// End the session and drop every cached list, so nothing fetched for
    /// one user is visible to the next.
    ///
    /// A session torn down by a rejected request (401/403) keeps the caches;
    /// call [`App::reset_caches`] when reacting to that.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.reset_caches().await;
    }

    pub async fn reset_caches(&self) {
        self.bookings.reset().await;
        self.rooms.reset().await;
        self.users.reset().await;
        tracing::debug!("store caches cleared");
    }
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
