use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 401; the session has already been cleared when this is returned
    #[error("Authentication failed")]
    Authentication,

    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Server returned no content where a body was expected")]
    EmptyResponse,

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication => Some(401),
            ApiError::Request { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
