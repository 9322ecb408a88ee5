use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::api::ApiError;
use crate::session::{self, SharedSession};

/// Default base URL of the task service
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Invoked after a 401 has cleared the session, so the UI can prompt for login again
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Per-call options for [`HttpClient::request`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Attach the session token; only login and register opt out
    pub auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            auth: true,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    pub fn patch() -> Self {
        Self {
            method: Method::PATCH,
            ..Self::default()
        }
    }

    /// Serialize `body` as the JSON payload of a request with the given method
    pub fn json<T: Serialize>(method: Method, body: &T) -> Result<Self, ApiError> {
        Ok(Self {
            method,
            body: Some(serde_json::to_value(body)?),
            auth: true,
        })
    }

    pub fn without_auth(mut self) -> Self {
        self.auth = false;
        self
    }
}

/// Thin JSON-over-HTTP wrapper: auth header, error normalization, session expiry.
///
/// Never retries and never queues; each call issues exactly one request.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
    session: SharedSession,
    on_session_expired: Option<SessionExpiredHook>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("has_session_hook", &self.on_session_expired.is_some())
            .finish()
    }
}

impl HttpClient {
    pub fn new(base_url: &str, session: SharedSession) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, session, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        session: SharedSession,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            http,
            session,
            on_session_expired: None,
        })
    }

    /// Register the callback fired when the server rejects the session
    pub fn on_session_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send one request; `Ok(None)` for 204 No Content
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.url(endpoint);
        let method = options.method.clone();

        let mut builder = self
            .http
            .request(options.method, &url)
            .header(CONTENT_TYPE, "application/json");

        if options.auth {
            // Token is read per request so a login or 401 is visible immediately
            let token = session::lock(&self.session).token().map(str::to_string);
            if let Some(token) = token {
                builder = builder.header(AUTHORIZATION, format!("Token {}", token));
            }
        }

        if let Some(ref body) = options.body {
            builder = builder.json(body);
        }

        debug!(%method, %url, "sending request");

        let response = builder.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "request failed before a response");
            ApiError::Network(e)
        })?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, %url, "session rejected by server");
            self.handle_auth_error();
            return Err(ApiError::Authentication);
        }

        if !status.is_success() {
            let body = response.bytes().await.ok();
            let message = body
                .as_deref()
                .and_then(|bytes| serde_json::from_slice::<Value>(bytes).ok())
                .and_then(|value| extract_error_message(&value))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(%method, %url, status = status.as_u16(), %message, "request rejected");
            return Err(ApiError::Request {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            debug!(%method, %url, "no content");
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Like [`request`](Self::request) but decodes the body into `T`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        match self.request(endpoint, options).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(ApiError::EmptyResponse),
        }
    }

    fn handle_auth_error(&self) {
        if let Err(e) = session::lock(&self.session).clear_auth() {
            error!(error = %e, "failed to remove persisted session");
        }

        if let Some(ref hook) = self.on_session_expired {
            hook();
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Checks `detail`, then `error`, then `non_field_errors`, then the first
/// field error in the form `field: message`.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;

    for key in ["detail", "error"] {
        if let Some(message) = object.get(key).and_then(first_message) {
            return Some(message);
        }
    }

    if let Some(message) = object.get("non_field_errors").and_then(first_message) {
        return Some(message);
    }

    object
        .iter()
        .find_map(|(field, value)| first_message(value).map(|m| format!("{}: {}", field, m)))
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use serde_json::json;

    #[test]
    fn test_detail_wins_over_error() {
        let body = json!({"detail": "Not found.", "error": "other"});
        assert_eq!(extract_error_message(&body), Some("Not found.".to_string()));
    }

    #[test]
    fn test_error_field_used() {
        let body = json!({"error": "Task not found"});
        assert_eq!(extract_error_message(&body), Some("Task not found".to_string()));
    }

    #[test]
    fn test_non_field_errors_used() {
        let body = json!({"non_field_errors": ["Unable to log in with provided credentials."]});
        assert_eq!(
            extract_error_message(&body),
            Some("Unable to log in with provided credentials.".to_string())
        );
    }

    #[test]
    fn test_field_errors_are_prefixed() {
        let body = json!({"username": ["A user with that username already exists."]});
        assert_eq!(
            extract_error_message(&body),
            Some("username: A user with that username already exists.".to_string())
        );
    }

    #[test]
    fn test_unrecognized_body_has_no_message() {
        assert_eq!(extract_error_message(&json!({})), None);
        assert_eq!(extract_error_message(&json!([1, 2])), None);
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let session = SessionStore::in_memory().into_shared();
        let result = HttpClient::new("ftp://example.com", session);
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let session = SessionStore::in_memory().into_shared();
        let client = HttpClient::new("http://127.0.0.1:8000/api/", session).unwrap();
        assert_eq!(client.url("/tasks/"), "http://127.0.0.1:8000/api/tasks/");
    }
}
