//! Defines the endpoint for deleting a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::IntoResponse,
};
use rusqlite::{Connection, params};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::UserId,
    database_id::TransactionId,
    events::{SnapshotFeed, publish_snapshot},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The feed that notifies stream subscribers after writes.
    pub snapshot_feed: Arc<SnapshotFeed>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            snapshot_feed: state.snapshot_feed.clone(),
        }
    }
}

/// A route handler for deleting one of the user's transactions.
///
/// Deletion is idempotent: the response is `{"ok": true}` whether or not the
/// transaction existed. A transaction belonging to another user is left
/// untouched, and the response does not reveal whether it existed.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<impl IntoResponse, Error> {
    let rows_affected = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        delete_transaction(transaction_id, user_id.as_str(), &connection)?
    };

    if rows_affected == 0 {
        tracing::debug!("delete for transaction {transaction_id} matched no rows");
    }

    if let Err(error) =
        publish_snapshot(&state.snapshot_feed, &state.db_connection, user_id.as_str()).await
    {
        tracing::error!("could not publish snapshot after delete: {error}");
    }

    Ok(Json(json!({"ok": true})))
}

type RowsAffected = usize;

fn delete_transaction(
    id: TransactionId,
    user_id: &str,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )
        .map_err(|err| err.into())
}
