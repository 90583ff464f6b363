//! Remote session management.
//!
//! A session pairs an authenticated directory client with the access token
//! that authorized it. Sync only proceeds while the session is valid. The
//! token is zeroized when the session is locked or dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use peoplesync_common::{Error, Result, SensitiveString};

use crate::directory::RemoteDirectory;

/// Message shown when sync is attempted without a valid session.
pub const AUTHENTICATE_FIRST: &str = "Please authenticate first";

/// Session handle for tracking active sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Generate a new unique session handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// State of the remote session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session is active and the token may be used.
    Active,
    /// Session is locked, the token has been cleared.
    Locked,
}

/// Authenticated connection to a remote directory.
pub struct RemoteSession {
    handle: SessionHandle,
    directory: Arc<dyn RemoteDirectory>,
    token: Option<SensitiveString>,
    expires_at: Option<DateTime<Utc>>,
    state: SessionState,
}

impl RemoteSession {
    /// Open a session over an already authenticated directory client.
    ///
    /// # Postconditions
    /// - Session is active with a unique handle
    pub fn open(
        directory: Arc<dyn RemoteDirectory>,
        token: SensitiveString,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let handle = SessionHandle::new();
        debug!("Opened session {} on {}", handle.as_str(), directory.name());
        Self {
            handle,
            directory,
            token: Some(token),
            expires_at,
            state: SessionState::Active,
        }
    }

    /// Open a session from credentials stored on disk.
    pub fn from_credentials(directory: Arc<dyn RemoteDirectory>, credentials: StoredCredentials) -> Self {
        Self::open(
            directory,
            SensitiveString::new(credentials.access_token),
            credentials.expires_at,
        )
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the session may be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let has_token = self.token.as_ref().is_some_and(|t| !t.is_empty());
        let unexpired = self.expires_at.map_or(true, |expiry| now < expiry);
        self.state == SessionState::Active && has_token && unexpired
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Get the directory client, if the session is valid.
    ///
    /// # Errors
    /// - `Precondition` when the session is locked, tokenless or expired
    pub fn directory(&self) -> Result<Arc<dyn RemoteDirectory>> {
        if !self.is_valid() {
            return Err(Error::Precondition(AUTHENTICATE_FIRST.to_string()));
        }
        Ok(self.directory.clone())
    }

    /// Lock the session and clear the token.
    pub fn lock(&mut self) {
        self.token = None;
        self.state = SessionState::Locked;
    }
}

impl std::fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("handle", &self.handle)
            .field("directory", &self.directory.name())
            .field("expires_at", &self.expires_at)
            .field("state", &self.state)
            .finish()
    }
}

/// Credentials persisted by a prior authentication.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    /// Load credentials from `path`. A missing file means not authenticated.
    ///
    /// # Errors
    /// - File exists but cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
