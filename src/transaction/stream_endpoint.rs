//! Defines the endpoint that streams live transaction snapshots.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{
        IntoResponse, Sse,
        sse::{Event, KeepAlive},
    },
};
use rusqlite::Connection;
use tokio_stream::{StreamExt, wrappers::WatchStream};

use crate::{
    AppState, Error,
    auth::UserId,
    events::SnapshotFeed,
    transaction::{TransactionListBody, core::list_transactions},
};

/// The state needed to stream transaction snapshots.
#[derive(Debug, Clone)]
pub struct TransactionStreamState {
    /// The database connection for reading the initial snapshot.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The feed that mutation endpoints publish snapshots to.
    pub snapshot_feed: Arc<SnapshotFeed>,
}

impl FromRef<AppState> for TransactionStreamState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            snapshot_feed: state.snapshot_feed.clone(),
        }
    }
}

/// A route handler that streams the user's transaction list over server-sent
/// events.
///
/// The first event is the current list and a new event follows every create or
/// delete, so clients never need to poll. Each event carries the same JSON
/// body as the list endpoint.
pub async fn transaction_stream_endpoint(
    State(state): State<TransactionStreamState>,
    Extension(user_id): Extension<UserId>,
) -> Result<impl IntoResponse, Error> {
    let current = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_transactions(user_id.as_str(), &connection)?
    };

    let receiver = state
        .snapshot_feed
        .subscribe(user_id.as_str(), current)
        .await;

    let stream = WatchStream::new(receiver).filter_map(|snapshot| {
        snapshot.map(|transactions| {
            Event::default().json_data(TransactionListBody {
                ok: true,
                transactions,
            })
        })
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
