//! Defines the data that will be shared between routes and how to create it.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, auth::TokenVerifier, db::initialize, events::SnapshotFeed};

/// The state of the application.
#[derive(Clone)]
pub struct AppState {
    /// Client for the external identity service, if one is configured.
    ///
    /// When this is `None` the server either trusts the `x-user-id` header
    /// (dev mode) or rejects every request (production mode).
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    /// Whether to trust the `x-user-id` header instead of bearer tokens.
    pub dev_mode: bool,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Used to resolve the default month for the summary endpoint.
    pub local_timezone: String,
    /// The database connection for persisting transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Live snapshot feeds for the transaction stream endpoint.
    pub snapshot_feed: Arc<SnapshotFeed>,
}

impl AppState {
    /// Create the app state.
    ///
    /// Initializes the database schema on `db_connection` before wrapping it.
    ///
    /// # Errors
    /// Returns an error if the database schema could not be created.
    pub fn new(
        db_connection: Connection,
        verifier: Option<Arc<dyn TokenVerifier>>,
        dev_mode: bool,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            verifier,
            dev_mode,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
            snapshot_feed: Arc::new(SnapshotFeed::new()),
        })
    }
}
