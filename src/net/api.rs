//! Shared REST client with credential and authorization interceptors.
//!
//! ARCHITECTURE
//! ============
//! Every store talks to the backend through one [`ApiClient`]. Outgoing
//! requests pass [`attach_credential`], which adds `Authorization: Bearer`
//! when a token is available and leaves anonymous requests untouched.
//! Responses pass the response interceptor: 401/403 tears the session down
//! no matter which store issued the call; every other failure is returned
//! unchanged for the caller to handle.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::{HttpRequest, HttpResponse, Transport};
use super::types::ErrorBody;
use crate::error::ClientError;
use crate::state::session::SessionContext;

// =============================================================================
// REQUEST BUILDER
// =============================================================================

#[derive(Clone, Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    bearer: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, bearer: None }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Use `token` for this request instead of the session credential.
    /// Login uses this to fetch the profile before the session is committed.
    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

// =============================================================================
// INTERCEPTORS
// =============================================================================

/// Format the `Authorization` header value for `token`.
#[must_use]
pub fn bearer_value(token: &str) -> String {
    format!("Bearer {token}")
}

/// Request interceptor: add the bearer credential when a token is present.
///
/// # Errors
///
/// Returns an error if the token is not a valid header value.
pub fn attach_credential(headers: &mut HeaderMap, token: Option<&str>) -> Result<(), ClientError> {
    if let Some(token) = token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&bearer_value(token))?);
    }
    Ok(())
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.summary())
        .unwrap_or_else(|| body.trim().to_owned())
}

fn parse_body(body: &str) -> Result<Value, ClientError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionContext>,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionContext>) -> Self {
        Self { transport, session }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// The `Authorization` value outgoing requests currently carry, if any.
    pub async fn credential_header(&self) -> Option<String> {
        self.session.token().await.map(|token| bearer_value(&token))
    }

    /// Send a request through both interceptors and return the decoded JSON
    /// body (`Value::Null` for empty bodies).
    ///
    /// # Errors
    ///
    /// - [`ClientError::Unauthorized`] on 401/403, after the session teardown.
    /// - [`ClientError::Api`] on any other non-success status.
    /// - Transport and decode errors as-is.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, ClientError> {
        let token = match request.bearer {
            Some(token) => Some(token),
            None => self.session.token().await,
        };
        let mut headers = HeaderMap::new();
        attach_credential(&mut headers, token.as_deref())?;

        let http = HttpRequest {
            method: request.method,
            path: request.path,
            query: request.query,
            headers,
            body: request.body,
        };
        let method = http.method.clone();
        let path = http.path.clone();
        let response = self.transport.execute(http).await?;
        tracing::debug!(%method, %path, status = response.status, "api response");
        self.intercept_response(response).await
    }

    /// [`Self::send`] and decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send`], plus [`ClientError::InvalidJson`] if the body
    /// does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let value = self.send(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn intercept_response(&self, response: HttpResponse) -> Result<Value, ClientError> {
        let status = response.status;
        if matches!(status, 401 | 403) {
            tracing::warn!(status, "authorization denied; ending session");
            self.session.teardown().await;
            return Err(ClientError::Unauthorized { status });
        }
        if !response.is_success() {
            return Err(ClientError::Api { status, message: error_message(&response.body) });
        }
        parse_body(&response.body)
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
