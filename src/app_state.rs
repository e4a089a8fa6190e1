//! Implements a struct that holds the state of the REST server.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use time::Duration;

use crate::{BlobStore, Error, LocalBlobStore, PasswordHash, TokenKeys, db::initialize};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys for signing and verifying session tokens.
    pub token_keys: TokenKeys,

    /// Where receipt images are stored.
    pub blob_store: Arc<dyn BlobStore>,

    /// The directory that is served at `/uploads`.
    pub upload_dir: PathBuf,

    /// The bcrypt cost for hashing new passwords.
    pub password_cost: u32,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models, and store receipt images as files in `upload_dir`.
    /// Tokens do not expire unless [AppState::with_token_duration] is used.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the upload
    /// directory cannot be created.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        upload_dir: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let upload_dir = upload_dir.as_ref().to_path_buf();
        let blob_store = LocalBlobStore::new(&upload_dir)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_keys: TokenKeys::new(token_secret),
            blob_store: Arc::new(blob_store),
            upload_dir,
            password_cost: PasswordHash::DEFAULT_COST,
        })
    }

    /// Set how long session tokens are valid for. `None` means they do not expire.
    pub fn with_token_duration(mut self, duration: Option<Duration>) -> Self {
        self.token_keys = self.token_keys.with_duration(duration);
        self
    }

    /// Set the bcrypt cost for hashing new passwords.
    ///
    /// Lower costs are only intended to speed up tests.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Store receipt images in `blob_store` instead of the upload directory.
    pub fn with_blob_store(mut self, blob_store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = blob_store;
        self
    }
}
