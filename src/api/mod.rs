//! REST client for the task service.
//!
//! [`HttpClient`] handles headers, errors and session expiry; the resource
//! clients build endpoints on top of it, and [`ApiClient`] bundles them
//! behind the [`TaskService`] trait used by the controller.

pub mod auth;
pub mod categories;
pub mod error;
pub mod http;
pub mod service;
pub mod tasks;

pub use auth::AuthClient;
pub use categories::CategoriesClient;
pub use error::ApiError;
pub use http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpClient, RequestOptions, SessionExpiredHook};
pub use service::{ApiClient, TaskService};
pub use tasks::TasksClient;
