use super::*;
use crate::net::types::Role;
use crate::router::{History, RouteName};
use crate::storage::MemoryStorage;
use crate::test_helpers::{MockTransport, admin, logged_in_app, member, test_app};
use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde_json::json;

fn script_login(mock: &MockTransport, token: &str, user: &User) {
    mock.reply(Method::POST, "/auth/login", 200, json!({"accessToken": token}));
    mock.reply(Method::GET, "/users/me", 200, serde_json::to_value(user).unwrap());
}

// =============================================================================
// Session snapshot
// =============================================================================

#[test]
fn snapshot_flags_follow_token_and_role() {
    let empty = Session::default();
    assert!(!empty.is_logged_in());
    assert!(!empty.is_admin());

    let member_session = Session { token: Some("t".into()), user: Some(member()) };
    assert!(member_session.is_logged_in());
    assert!(!member_session.is_admin());

    let admin_session = Session { token: Some("t".into()), user: Some(admin()) };
    assert!(admin_session.is_admin());
}

// =============================================================================
// restore
// =============================================================================

#[tokio::test]
async fn restore_reads_both_entries() {
    let mock = MockTransport::new();
    let (app, _) = logged_in_app(&mock, "persisted", &admin());

    let session = app.context().snapshot().await;
    assert_eq!(session.token.as_deref(), Some("persisted"));
    assert_eq!(session.user.unwrap().role, Role::Admin);
    assert!(app.context().is_admin().await);
}

#[tokio::test]
async fn restore_drops_corrupt_user_but_keeps_token() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_items(&[(TOKEN_KEY, "tok"), (USER_KEY, "{not json")]).unwrap();

    let context = SessionContext::restore(storage, Arc::new(History::new())).unwrap();
    let session = context.snapshot().await;
    assert_eq!(session.token.as_deref(), Some("tok"));
    assert!(session.user.is_none());
    assert!(!session.is_admin());
}

// =============================================================================
// login / register
// =============================================================================

#[tokio::test]
async fn login_commits_token_user_and_storage_together() {
    let mock = MockTransport::new();
    script_login(&mock, "fresh", &member());
    let (app, storage) = test_app(&mock);

    let user = app.session.login("user1@example.com", "secret").await.unwrap();
    assert_eq!(user.id, 1);

    assert!(app.context().is_logged_in().await);
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
    let stored: User = serde_json::from_str(&storage.get_item(USER_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored, member());
    assert_eq!(app.api.credential_header().await.as_deref(), Some("Bearer fresh"));

    let me = &mock.requests_to(&Method::GET, "/users/me")[0];
    assert_eq!(me.headers.get(AUTHORIZATION).unwrap(), "Bearer fresh");
    let login = &mock.requests_to(&Method::POST, "/auth/login")[0];
    assert_eq!(login.body, Some(json!({"email": "user1@example.com", "password": "secret"})));
}

#[tokio::test]
async fn login_navigates_to_return_path_then_landing() {
    let mock = MockTransport::new();
    script_login(&mock, "fresh", &member());
    let (app, _) = test_app(&mock);

    app.router.navigate("/profile").await;
    assert_eq!(app.history.current().unwrap().route, RouteName::Login);

    app.session.login("user1@example.com", "secret").await.unwrap();
    assert_eq!(app.history.current().unwrap().path, "/profile");

    app.session.logout().await;
    app.session.login("user1@example.com", "secret").await.unwrap();
    assert_eq!(app.history.current().unwrap().route, RouteName::MyBookings);
}

#[tokio::test]
async fn failed_login_leaves_session_empty() {
    let mock = MockTransport::new();
    mock.reply(Method::POST, "/auth/login", 400, json!({"message": "Invalid email or password"}));
    let (app, storage) = test_app(&mock);

    let err = app.session.login("user1@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
    assert!(!app.context().is_logged_in().await);
    assert!(storage.get_item(TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn profile_fetch_failure_commits_nothing() {
    let mock = MockTransport::new();
    mock.reply(Method::POST, "/auth/login", 200, json!({"accessToken": "fresh"}));
    mock.reply(Method::GET, "/users/me", 500, json!({"message": "db down"}));
    let (app, storage) = test_app(&mock);

    assert!(app.session.login("user1@example.com", "secret").await.is_err());
    assert_eq!(app.context().snapshot().await, Session::default());
    assert!(storage.get_item(TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn login_validates_before_sending() {
    let mock = MockTransport::new();
    let (app, _) = test_app(&mock);

    let err = app.session.login("not-an-email", "secret").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn register_authenticates_like_login() {
    let mock = MockTransport::new();
    mock.reply(Method::POST, "/auth/register", 201, json!({"accessToken": "new"}));
    mock.reply(Method::GET, "/users/me", 200, serde_json::to_value(member()).unwrap());
    let (app, _) = test_app(&mock);

    app.session.register("User 1", "user1@example.com", "Str0ng!pass").await.unwrap();
    assert_eq!(app.context().token().await.as_deref(), Some("new"));
    assert_eq!(app.history.current().unwrap().route, RouteName::MyBookings);

    let body = mock.requests_to(&Method::POST, "/auth/register")[0].body.clone().unwrap();
    assert_eq!(body["isAdmin"], false);
    assert_eq!(body["fullName"], "User 1");
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let mock = MockTransport::new();
    let (app, _) = test_app(&mock);

    assert!(app.session.register("User 1", "user1@example.com", "weak").await.is_err());
    assert!(mock.requests().is_empty());
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_is_idempotent() {
    let mock = MockTransport::new();
    let (app, storage) = logged_in_app(&mock, "tok", &member());

    app.session.logout().await;
    let first = (app.context().snapshot().await, storage.get_item(TOKEN_KEY).unwrap(), app.history.current());
    app.session.logout().await;
    let second = (app.context().snapshot().await, storage.get_item(TOKEN_KEY).unwrap(), app.history.current());

    assert_eq!(first, second);
    assert_eq!(first.0, Session::default());
    assert_eq!(first.2.unwrap().route, RouteName::Login);
    assert!(storage.get_item(USER_KEY).unwrap().is_none());
}

// =============================================================================
// profile
// =============================================================================

#[tokio::test]
async fn update_profile_uses_default_timezone() {
    let mock = MockTransport::new();
    let mut renamed = member();
    renamed.full_name = "Renamed".into();
    mock.reply(Method::PUT, "/users/me", 200, serde_json::to_value(&renamed).unwrap());
    let (app, storage) = logged_in_app(&mock, "tok", &member());

    app.session.update_profile("Renamed").await.unwrap();
    let body = mock.requests_to(&Method::PUT, "/users/me")[0].body.clone().unwrap();
    assert_eq!(body, json!({"fullName": "Renamed", "timezone": DEFAULT_TIMEZONE}));

    assert_eq!(app.context().user().await.unwrap().full_name, "Renamed");
    assert!(storage.get_item(USER_KEY).unwrap().unwrap().contains("Renamed"));
    assert_eq!(app.context().token().await.as_deref(), Some("tok"));
}

#[tokio::test]
async fn update_profile_keeps_stored_timezone() {
    let mock = MockTransport::new();
    let mut current = member();
    current.timezone = Some("Europe/Berlin".into());
    mock.reply(Method::PUT, "/users/me", 200, serde_json::to_value(&current).unwrap());
    let (app, _) = logged_in_app(&mock, "tok", &current);

    app.session.update_profile("User 1").await.unwrap();
    let body = mock.requests_to(&Method::PUT, "/users/me")[0].body.clone().unwrap();
    assert_eq!(body["timezone"], "Europe/Berlin");
}

#[tokio::test]
async fn update_profile_requires_user() {
    let mock = MockTransport::new();
    let (app, _) = test_app(&mock);

    let err = app.session.update_profile("Someone").await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
}

#[tokio::test]
async fn change_password_sends_both_fields() {
    let mock = MockTransport::new();
    mock.reply(Method::PUT, "/users/me/change-password", 200, serde_json::Value::Null);
    let (app, _) = logged_in_app(&mock, "tok", &member());

    app.session.change_password("Old1!pass", "N3w!password").await.unwrap();
    let body = mock.requests_to(&Method::PUT, "/users/me/change-password")[0].body.clone().unwrap();
    assert_eq!(body, json!({"oldPassword": "Old1!pass", "newPassword": "N3w!password"}));
}

#[tokio::test]
async fn change_password_enforces_policy() {
    let mock = MockTransport::new();
    let (app, _) = logged_in_app(&mock, "tok", &member());

    assert!(app.session.change_password("Old1!pass", "short").await.is_err());
    assert!(mock.requests().is_empty());
}
