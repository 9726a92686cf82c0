//! Shared fixtures: a scripted transport, sample entities, and app builders.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use time::macros::datetime;
use tokio::sync::Notify;

use crate::app::App;
use crate::error::ClientError;
use crate::net::transport::{HttpRequest, HttpResponse, Transport};
use crate::net::types::{Booking, BookingStatus, Role, Room, User};
use crate::storage::{MemoryStorage, Storage, TOKEN_KEY, USER_KEY};

// =============================================================================
// MockTransport
// =============================================================================

/// Lets a test observe a request in flight and decide when it completes.
#[derive(Clone, Default)]
pub struct Gate {
    pub arrived: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Clone)]
struct Reply {
    status: u16,
    body: String,
    gate: Option<Gate>,
}

/// Replies are scripted per method + path (query ignored) and consumed in
/// order; the last one repeats. Unscripted routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Reply { status, body: body.to_string(), gate: None });
    }

    /// Script a reply that is held until `gate.release` is notified.
    pub fn reply_gated(&self, method: Method, path: &str, status: u16, body: Value) -> Gate {
        let gate = Gate::default();
        self.push(method, path, Reply { status, body: body.to_string(), gate: Some(gate.clone()) });
        gate
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.lock().unwrap().push(request);

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        let Some(reply) = reply else {
            return Ok(HttpResponse { status: 404, body: json!({"message": "no scripted reply"}).to_string() });
        };
        if let Some(gate) = &reply.gate {
            gate.arrived.notify_one();
            gate.release.notified().await;
        }
        Ok(HttpResponse { status: reply.status, body: reply.body })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

#[must_use]
pub fn user(id: i64, role: Role) -> User {
    User {
        id,
        full_name: format!("User {id}"),
        email: format!("user{id}@example.com"),
        role,
        timezone: None,
        is_active: Some(true),
    }
}

#[must_use]
pub fn member() -> User {
    user(1, Role::Member)
}

#[must_use]
pub fn admin() -> User {
    user(99, Role::Admin)
}

#[must_use]
pub fn room(id: i64, active: bool) -> Room {
    Room {
        id,
        name: format!("Room {id}"),
        capacity: Some(6),
        location: Some("Floor 2".into()),
        equipments_json: None,
        is_active: Some(active),
    }
}

#[must_use]
pub fn booking(id: i64) -> Booking {
    Booking {
        id,
        title: format!("Booking {id}"),
        notes: None,
        status: BookingStatus::Confirmed,
        start_at: datetime!(2030-03-01 09:00 UTC),
        end_at: datetime!(2030-03-01 10:00 UTC),
        cancelled_at: None,
        room: Some(room(1, true)),
        user: Some(member()),
    }
}

/// Wrap `items` in the backend's page envelope.
pub fn page<T: Serialize>(items: &[T]) -> Value {
    json!({ "content": items, "totalElements": items.len() })
}

// =============================================================================
// Apps
// =============================================================================

/// Logged-out app over `transport` with empty in-memory storage.
#[must_use]
pub fn test_app(transport: &Arc<MockTransport>) -> (App, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let app = App::assemble(transport.clone(), storage.clone()).expect("assemble should not fail");
    (app, storage)
}

/// App restored from storage holding `token` and `user`.
#[must_use]
pub fn logged_in_app(transport: &Arc<MockTransport>, token: &str, user: &User) -> (App, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let raw_user = serde_json::to_string(user).expect("user serializes");
    storage
        .set_items(&[(TOKEN_KEY, token), (USER_KEY, raw_user.as_str())])
        .expect("memory storage never fails");
    let app = App::assemble(transport.clone(), storage.clone()).expect("assemble should not fail");
    (app, storage)
}
