//! Defines the endpoint for recording a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde_json::{Value, json};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error, FieldError,
    auth::UserId,
    events::{SnapshotFeed, publish_snapshot},
    transaction::{Transaction, core::create_transaction},
};

/// The format dates must be submitted in.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The longest category name that will be accepted, in characters.
const MAX_CATEGORY_LENGTH: usize = 150;

/// The longest description that will be accepted, in characters.
const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The feed that notifies stream subscribers after writes.
    pub snapshot_feed: Arc<SnapshotFeed>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            snapshot_feed: state.snapshot_feed.clone(),
        }
    }
}

/// A validated request to record a transaction.
///
/// Produced by [validate_payload], consumed by the create handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// When the money was spent.
    pub date: Date,
    /// The spending category, already trimmed.
    pub category: String,
    /// The amount of money spent.
    pub amount: f64,
    /// An optional note about the transaction.
    pub description: Option<String>,
}

/// Check `payload` for the fields needed to record a transaction.
///
/// Every offending field is reported, not just the first, so clients can show
/// all the feedback in one round trip.
pub fn validate_payload(payload: &Value) -> Result<NewTransaction, Vec<FieldError>> {
    let mut errors = Vec::new();

    let date = payload
        .get("date")
        .and_then(Value::as_str)
        .and_then(|text| Date::parse(text, DATE_FORMAT).ok());
    if date.is_none() {
        errors.push(FieldError {
            field: "date",
            message: "date must be YYYY-MM-DD",
        });
    }

    let category = payload
        .get("category")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|category| (1..=MAX_CATEGORY_LENGTH).contains(&category.chars().count()));
    if category.is_none() {
        errors.push(FieldError {
            field: "category",
            message: "category must be 1-150 characters",
        });
    }

    let amount = payload.get("amount").and_then(parse_amount);
    if amount.is_none() {
        errors.push(FieldError {
            field: "amount",
            message: "amount must be a number",
        });
    }

    let description = match payload.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if text.chars().count() <= MAX_DESCRIPTION_LENGTH => {
            Some(text.clone())
        }
        Some(_) => {
            errors.push(FieldError {
                field: "description",
                message: "description must be at most 1000 characters",
            });
            None
        }
    };

    match (date, category, amount) {
        (Some(date), Some(category), Some(amount)) if errors.is_empty() => Ok(NewTransaction {
            date,
            category: category.to_owned(),
            amount,
            description,
        }),
        _ => Err(errors),
    }
}

/// Accepts JSON numbers and numeric strings such as `"42.50"`.
fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    };

    amount.filter(|amount| amount.is_finite())
}

/// A route handler for recording a new transaction.
///
/// Responds with status 201 and the stored transaction on success, or status
/// 400 listing every invalid field. A missing request body is treated the same
/// as an empty one.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserId>,
    payload: Option<Json<Value>>,
) -> Result<impl IntoResponse, Error> {
    let payload = payload.map(|Json(value)| value).unwrap_or(Value::Null);
    let new_transaction = validate_payload(&payload).map_err(Error::Validation)?;

    let transaction = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        create_transaction(
            Transaction::build(
                user_id.as_str(),
                new_transaction.amount,
                new_transaction.date,
                &new_transaction.category,
            )
            .description(new_transaction.description),
            &connection,
        )?
    };

    if let Err(error) =
        publish_snapshot(&state.snapshot_feed, &state.db_connection, user_id.as_str()).await
    {
        tracing::error!("could not publish snapshot after create: {error}");
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({"ok": true, "transaction": transaction})),
    ))
}
