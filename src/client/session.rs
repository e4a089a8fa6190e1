//! The cached session of the logged in user.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{AuthResponse, Identity, client::ClientError};

/// How long a session is cached for after logging in.
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::days(7);

/// The identity and token of the logged in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Who is logged in.
    pub identity: Identity,
    /// The bearer token sent with every authenticated request.
    pub token: String,
    /// When the cached session stops being used.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Create a session from a register or log in response that expires
    /// [DEFAULT_SESSION_LIFETIME] after `now`.
    pub fn new(response: AuthResponse, now: OffsetDateTime) -> Self {
        Self {
            identity: response.identity,
            token: response.token,
            expires_at: now + DEFAULT_SESSION_LIFETIME,
        }
    }

    /// Whether the session has expired at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Holds at most one [Session], optionally persisted to a JSON file so that
/// it survives between runs of the command line client.
#[derive(Debug, Default)]
pub struct SessionStore {
    session: Option<Session>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Create a store that only keeps the session in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create a store backed by the JSON file at `path`, loading the session
    /// saved there if the file exists.
    ///
    /// # Errors
    ///
    /// Returns a [ClientError::SessionFile] if the file exists but cannot be
    /// read or does not contain a session.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();

        let session = match fs::read_to_string(&path) {
            Ok(contents) => Some(
                serde_json::from_str(&contents)
                    .map_err(|error| ClientError::SessionFile(error.to_string()))?,
            ),
            Err(error) if error.kind() == ErrorKind::NotFound => None,
            Err(error) => return Err(ClientError::SessionFile(error.to_string())),
        };

        Ok(Self {
            session,
            path: Some(path),
        })
    }

    /// The session, or `None` if there is none or it expired before `now`.
    ///
    /// An expired session is evicted.
    pub fn current(&mut self, now: OffsetDateTime) -> Option<&Session> {
        if self
            .session
            .as_ref()
            .is_some_and(|session| session.is_expired(now))
        {
            tracing::info!("The cached session has expired.");

            if let Err(error) = self.evict() {
                tracing::warn!("Could not remove the expired session: {error}");
            }
        }

        self.session.as_ref()
    }

    /// Replace the cached session with `session`.
    ///
    /// # Errors
    ///
    /// Returns a [ClientError::SessionFile] if the session cannot be saved.
    pub fn save(&mut self, session: Session) -> Result<(), ClientError> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .map_err(|error| ClientError::SessionFile(error.to_string()))?;
            }

            let contents = serde_json::to_string_pretty(&session)
                .map_err(|error| ClientError::SessionFile(error.to_string()))?;
            fs::write(path, contents).map_err(|error| ClientError::SessionFile(error.to_string()))?;
        }

        self.session = Some(session);

        Ok(())
    }

    /// Forget the cached session.
    ///
    /// # Errors
    ///
    /// Returns a [ClientError::SessionFile] if the saved session cannot be removed.
    pub fn evict(&mut self) -> Result<(), ClientError> {
        self.session = None;

        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => return Err(ClientError::SessionFile(error.to_string())),
            }
        }

        Ok(())
    }
}
