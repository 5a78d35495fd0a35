//! Defines the endpoint for listing a user's transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    auth::UserId,
    transaction::{Transaction, core::list_transactions},
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct TransactionListState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body for a transaction list.
///
/// Also serialized into the live stream's events so that polling clients and
/// streaming clients see the same shape.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionListBody {
    /// Whether the request succeeded. Errors use the error envelope instead.
    pub ok: bool,
    /// The user's transactions, most recent first.
    pub transactions: Vec<Transaction>,
}

/// A route handler that lists all of the user's transactions, most recent
/// first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionListState>,
    Extension(user_id): Extension<UserId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = list_transactions(user_id.as_str(), &connection)?;

    Ok(Json(TransactionListBody {
        ok: true,
        transactions,
    }))
}
