use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// File name of the persisted session inside the data directory
pub const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read session file: {0}")]
    ReadError(String),
    #[error("Failed to parse session file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Failed to write session file: {0}")]
    WriteError(String),
}

/// Token and username as stored on disk, keyed by fixed names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Holds the authenticated user's credentials and mirrors every change to disk.
///
/// `token` is `Some` exactly when the user is considered authenticated.
#[derive(Debug)]
pub struct SessionStore {
    session: Session,
    path: Option<PathBuf>,
}

/// Handle shared by the HTTP client and the UI; never held across an await
pub type SharedSession = Arc<Mutex<SessionStore>>;

impl SessionStore {
    /// Restore a session from `path`; a missing file yields an empty session
    pub fn load(path: PathBuf) -> Result<Self, SessionError> {
        let session = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| SessionError::ReadError(e.to_string()))?;
            if contents.trim().is_empty() {
                Session::default()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            Session::default()
        };

        Ok(Self {
            session,
            path: Some(path),
        })
    }

    /// A store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            session: Session::default(),
            path: None,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref()
    }

    pub fn current_username(&self) -> Option<&str> {
        self.session.username.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.token.is_some()
    }

    pub fn set_token(&mut self, token: impl Into<String>) -> Result<(), SessionError> {
        self.session.token = Some(token.into());
        self.persist()
    }

    pub fn set_username(&mut self, username: impl Into<String>) -> Result<(), SessionError> {
        self.session.username = Some(username.into());
        self.persist()
    }

    /// Forget the token and username, in memory first and then on disk
    pub fn clear_auth(&mut self) -> Result<(), SessionError> {
        self.session = Session::default();
        if let Some(ref path) = self.path {
            if path.exists() {
                fs::remove_file(path).map_err(|e| SessionError::WriteError(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), SessionError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::WriteError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&self.session)?;
        fs::write(path, json).map_err(|e| SessionError::WriteError(e.to_string()))
    }
}

/// Lock the shared store, recovering the data if a previous holder panicked
pub fn lock(session: &SharedSession) -> MutexGuard<'_, SessionStore> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_unauthenticated() {
        let dir = tempdir().unwrap();
        let store = SessionStore::load(dir.path().join(SESSION_FILE_NAME)).unwrap();
        assert!(!store.is_authenticated());
        assert!(store.current_username().is_none());
    }

    #[test]
    fn test_session_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE_NAME);

        let mut store = SessionStore::load(path.clone()).unwrap();
        store.set_token("abc").unwrap();
        store.set_username("alice").unwrap();

        let reloaded = SessionStore::load(path.clone()).unwrap();
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.token(), Some("abc"));
        assert_eq!(reloaded.current_username(), Some("alice"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"authToken\""));
    }

    #[test]
    fn test_clear_auth_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE_NAME);

        let mut store = SessionStore::load(path.clone()).unwrap();
        store.set_token("abc").unwrap();
        store.clear_auth().unwrap();

        assert!(!store.is_authenticated());
        assert!(!path.exists());
        assert!(!SessionStore::load(path).unwrap().is_authenticated());
    }

    #[test]
    fn test_in_memory_store_writes_nothing() {
        let mut store = SessionStore::in_memory();
        store.set_token("abc").unwrap();
        assert!(store.is_authenticated());
        assert!(store.path().is_none());
    }
}
