//! Persistence for the signed-in session.
//!
//! The session is a bearer token plus the user object returned at sign-in.
//! [`FileTokenStore`] keeps both in a small JSON file (`{"token": ..., "user": ...}`)
//! so consecutive CLI invocations share one login; [`MemoryTokenStore`] is used by
//! embedders and tests.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::User;

/// Errors reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored session is not valid JSON.
    #[error("session storage is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

/// A persisted session: the bearer token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct StoredSession {
    /// Bearer token sent as `Authorization: Bearer <token>`.
    pub token: SecretString,
    /// User returned by the backend at sign-in, if any.
    pub user: Option<User>,
}

impl StoredSession {
    /// Create a session from a raw token and optional user.
    #[must_use]
    pub fn new(token: impl Into<String>, user: Option<User>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user,
        }
    }
}

/// Storage backend for the session.
pub trait TokenStore: Send + Sync {
    /// Load the current session, if one is stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the storage cannot be read or is corrupt.
    fn load(&self) -> Result<Option<StoredSession>, StoreError>;

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the session cannot be written.
    fn save(&self, session: &StoredSession) -> Result<(), StoreError>;

    /// Remove the stored session. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the storage cannot be modified.
    fn clear(&self) -> Result<(), StoreError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Session store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<Option<StoredSession>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session.
    #[must_use]
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        Ok(self
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), StoreError> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// File store
// =============================================================================

/// On-disk layout of the session file.
#[derive(Serialize, Deserialize)]
struct SessionFile {
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

/// Session store backed by a JSON file.
///
/// The file is re-read on every [`TokenStore::load`], so a login performed by
/// another process is picked up on the next request.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store using the given file path. The file need not exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        let file: SessionFile = serde_json::from_str(&contents)?;
        if file.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(StoredSession::new(file.token, file.user)))
    }

    fn save(&self, session: &StoredSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = SessionFile {
            token: session.token.expose_secret().to_string(),
            user: session.user.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)?;

        // Write to a sibling temp file first so a crash never leaves half a token
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
