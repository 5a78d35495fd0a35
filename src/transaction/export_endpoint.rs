//! Defines the endpoint for downloading a user's transactions as a CSV file.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header,
    response::IntoResponse,
};
use rusqlite::Connection;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::{
    AppState, Error,
    auth::UserId,
    transaction::{Transaction, core::list_transactions},
};

/// The format dates are written in, matching the format they are submitted in.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that downloads all of the user's transactions as a CSV
/// attachment named `transactions_<user id>.csv`.
///
/// Responds with status 400 when the user has nothing to export.
pub async fn export_transactions_endpoint(
    State(state): State<ExportTransactionsState>,
    Extension(user_id): Extension<UserId>,
) -> Result<impl IntoResponse, Error> {
    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_transactions(user_id.as_str(), &connection)?
    };

    if transactions.is_empty() {
        return Err(Error::EmptyExport);
    }

    let csv = transactions_to_csv(&transactions)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"transactions_{user_id}.csv\""),
            ),
        ],
        csv,
    ))
}

/// Render `transactions` as CSV with a `date,category,amount,description`
/// header row.
///
/// Every field is quoted, and quoting follows RFC 4180: embedded quotes are
/// doubled.
fn transactions_to_csv(transactions: &[Transaction]) -> Result<String, Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(["date", "category", "amount", "description"])
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for transaction in transactions {
        let date = transaction
            .date
            .format(DATE_FORMAT)
            .map_err(|error| Error::CsvError(error.to_string()))?;

        writer
            .write_record([
                date,
                transaction.category.clone(),
                transaction.amount.to_string(),
                transaction.description.clone().unwrap_or_default(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}
