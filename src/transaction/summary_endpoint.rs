//! Defines the endpoint summarizing a month's spending by category.
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::IntoResponse,
};
use rusqlite::{Connection, params, types::Value};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{AppState, Error, FieldError, auth::UserId, timezone::local_today};

/// The format used to parse the `month` query parameter once a day is
/// appended.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The state needed to summarize a month.
#[derive(Debug, Clone)]
pub struct MonthlySummaryState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone used to resolve the default month.
    pub local_timezone: String,
}

impl FromRef<AppState> for MonthlySummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters for the summary endpoint.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// The month to summarize as `YYYY-MM`. Defaults to the previous calendar
    /// month in the server's local timezone.
    month: Option<String>,
}

/// A month's spending broken down by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// The month the summary covers, as `YYYY-MM`.
    pub month: String,
    /// Total spent in the month per category.
    #[serde(rename = "totalsByCategory")]
    pub totals_by_category: BTreeMap<String, f64>,
    /// Total spent in the month across all categories.
    pub total: f64,
    /// How many transactions fell inside the month.
    pub count: usize,
    /// The first and last day of the month.
    pub range: MonthRange,
}

/// The inclusive day range a summary covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRange {
    /// The first day of the month.
    pub start: Date,
    /// The last day of the month.
    pub end: Date,
}

#[derive(Debug, Serialize)]
struct MonthlySummaryBody {
    ok: bool,
    #[serde(flatten)]
    summary: MonthlySummary,
}

/// A route handler that totals the user's spending per category for one month.
///
/// The month comes from the `month` query parameter, or defaults to the
/// previous calendar month so that "how did last month go?" needs no
/// arguments. An unparseable month is rejected with status 400.
pub async fn monthly_summary_endpoint(
    State(state): State<MonthlySummaryState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, Error> {
    let (start, end) = match query.month.as_deref() {
        Some(month) => parse_month_window(month).ok_or_else(|| {
            Error::Validation(vec![FieldError {
                field: "month",
                message: "month must be YYYY-MM",
            }])
        })?,
        None => previous_month_window(local_today(&state.local_timezone)?),
    };

    let summary = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        summarize_month(user_id.as_str(), start, end, &connection)?
    };

    Ok(Json(MonthlySummaryBody { ok: true, summary }))
}

/// Parse a `YYYY-MM` month into its first and last day.
fn parse_month_window(month: &str) -> Option<(Date, Date)> {
    let start = Date::parse(&format!("{month}-01"), DATE_FORMAT).ok()?;
    let end = start
        .replace_day(start.month().length(start.year()))
        .ok()?;

    Some((start, end))
}

/// The first and last day of the month before the one containing `today`.
fn previous_month_window(today: Date) -> (Date, Date) {
    let end = today.replace_day(1).unwrap().previous_day().unwrap();
    let start = end.replace_day(1).unwrap();

    (start, end)
}

fn month_label(start: Date) -> String {
    format!("{:04}-{:02}", start.year(), u8::from(start.month()))
}

/// Total spending per category for transactions dated within
/// `[start, end]`.
///
/// Rows written by other tools may hold junk in the amount column; those
/// amounts count as zero rather than failing the whole summary, and rows with
/// a blank category are grouped under "Other".
fn summarize_month(
    user_id: &str,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<MonthlySummary, Error> {
    let mut statement = connection.prepare(
        "SELECT category, amount FROM \"transaction\"
         WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
    )?;

    let rows = statement.query_map(params![user_id, start, end], |row| {
        let category: Option<String> = row.get(0)?;
        let amount: Value = row.get(1)?;

        Ok((category, amount))
    })?;

    let mut totals_by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = 0.0;
    let mut count = 0;

    for row in rows {
        let (category, amount) = row.map_err(Error::SqlError)?;

        let amount = match amount {
            Value::Real(amount) => amount,
            Value::Integer(amount) => amount as f64,
            Value::Text(text) => text
                .parse::<f64>()
                .ok()
                .filter(|amount| amount.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        };
        let category = category
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| "Other".to_owned());

        *totals_by_category.entry(category).or_insert(0.0) += amount;
        total += amount;
        count += 1;
    }

    Ok(MonthlySummary {
        month: month_label(start),
        totals_by_category,
        total,
        count,
        range: MonthRange { start, end },
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        auth::UserId,
        db::initialize,
        transaction::{
            Transaction, create_transaction, monthly_summary_endpoint,
            summary_endpoint::{MonthlySummaryState, SummaryQuery, previous_month_window},
        },
    };

    fn get_test_state() -> MonthlySummaryState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        MonthlySummaryState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn month_query(month: &str) -> Query<SummaryQuery> {
        Query(SummaryQuery {
            month: Some(month.to_owned()),
        })
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn previous_month_window_handles_january() {
        let (start, end) = previous_month_window(date!(2025 - 01 - 15));

        assert_eq!(start, date!(2024 - 12 - 01));
        assert_eq!(end, date!(2024 - 12 - 31));
    }

    #[tokio::test]
    async fn sums_categories_for_the_requested_month() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            for (user_id, amount, date, category) in [
                ("alice", 10.0, date!(2025 - 10 - 01), "Groceries"),
                ("alice", 20.0, date!(2025 - 10 - 20), "Groceries"),
                ("alice", 5.0, date!(2025 - 10 - 31), "Transport"),
                ("alice", 99.0, date!(2025 - 11 - 01), "Groceries"),
                ("bob", 50.0, date!(2025 - 10 - 10), "Groceries"),
            ] {
                create_transaction(Transaction::build(user_id, amount, date, category), &connection)
                    .unwrap();
            }
        }

        let response = monthly_summary_endpoint(
            State(state),
            Extension(UserId::new("alice")),
            month_query("2025-10"),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["month"], "2025-10");
        assert_eq!(json["totalsByCategory"], json!({"Groceries": 30.0, "Transport": 5.0}));
        assert_eq!(json["total"], 35.0);
        assert_eq!(json["count"], 3);
        assert_eq!(json["range"]["start"], "2025-10-01");
        assert_eq!(json["range"]["end"], "2025-10-31");
    }

    #[tokio::test]
    async fn leap_year_february_includes_the_29th() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build("alice", 7.0, date!(2024 - 02 - 29), "Groceries"),
                &connection,
            )
            .unwrap();
        }

        let response = monthly_summary_endpoint(
            State(state),
            Extension(UserId::new("alice")),
            month_query("2024-02"),
        )
        .await
        .into_response();

        let json = response_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["range"]["end"], "2024-02-29");
    }

    #[tokio::test]
    async fn rejects_months_that_do_not_parse() {
        for month in ["2025-13", "202510", "2025-1", "October", ""] {
            let state = get_test_state();

            let response = monthly_summary_endpoint(
                State(state),
                Extension(UserId::new("alice")),
                month_query(month),
            )
            .await
            .into_response();

            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "month {month:?} should be rejected"
            );

            let json = response_json(response).await;
            assert_eq!(json["details"][0]["field"], "month");
            assert_eq!(json["details"][0]["message"], "month must be YYYY-MM");
        }
    }

    #[tokio::test]
    async fn blank_category_falls_back_to_other() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build("alice", 5.0, date!(2025 - 10 - 05), ""),
                &connection,
            )
            .unwrap();
        }

        let response = monthly_summary_endpoint(
            State(state),
            Extension(UserId::new("alice")),
            month_query("2025-10"),
        )
        .await
        .into_response();

        let json = response_json(response).await;
        assert_eq!(json["totalsByCategory"], json!({"Other": 5.0}));
    }

    #[tokio::test]
    async fn malformed_amount_counts_as_zero() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            // Bypass the model so the row looks like one written by another
            // tool.
            connection
                .execute(
                    "INSERT INTO \"transaction\"
                     (user_id, date, category, amount, description, created_at)
                     VALUES ('alice', '2025-10-05', 'Misc', 'not a number', NULL,
                             '2025-10-05T00:00:00Z')",
                    (),
                )
                .unwrap();
        }

        let response = monthly_summary_endpoint(
            State(state),
            Extension(UserId::new("alice")),
            month_query("2025-10"),
        )
        .await
        .into_response();

        let json = response_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["total"], 0.0);
        assert_eq!(json["totalsByCategory"], json!({"Misc": 0.0}));
    }

    #[tokio::test]
    async fn month_without_transactions_summarizes_to_zero() {
        let state = get_test_state();

        let response = monthly_summary_endpoint(
            State(state),
            Extension(UserId::new("alice")),
            month_query("2025-10"),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["total"], 0.0);
        assert_eq!(json["count"], 0);
        assert_eq!(json["totalsByCategory"], json!({}));
    }

    #[tokio::test]
    async fn defaults_to_the_previous_month() {
        let state = get_test_state();
        let today = time::OffsetDateTime::now_utc().date();
        let (expected_start, _) = previous_month_window(today);

        let response = monthly_summary_endpoint(
            State(state),
            Extension(UserId::new("alice")),
            Query(SummaryQuery { month: None }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        let expected_label = format!(
            "{:04}-{:02}",
            expected_start.year(),
            u8::from(expected_start.month())
        );
        assert_eq!(json["month"], expected_label);
        assert_eq!(json["range"]["start"].as_str().unwrap().split('-').nth(2), Some("01"));
    }
}
