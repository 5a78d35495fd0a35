//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for displaying the dashboard and adding transactions to it
//! - HTML view functions for rendering the dashboard UI
//! - State, query and form types used by the handlers

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRequest;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};
use time::Date;

use crate::{
    AppState, Error,
    auth::UserId,
    dashboard::{
        aggregation::{
            format_month_labels, get_sorted_months, monthly_spending_by_category,
            next_month_label,
        },
        cards::prediction_cards_view,
        charts::{
            DashboardChart, charts_inline_script, charts_script, charts_view, spending_chart,
        },
        forecast::predict_spending,
        tables::recent_transactions_table,
    },
    endpoints,
    events::{SnapshotFeed, publish_snapshot},
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_TEXT_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, base, rupee_input_styles,
    },
    timezone::local_today,
    transaction::{Transaction, create_transaction, list_transactions, validate_payload},
};

/// The CDN location of the ECharts build loaded on full page loads.
const ECHARTS_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// The state needed for displaying the dashboard page.
///
/// Contains the database connection, the snapshot feed notified after writes,
/// and timezone information required by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The feed that notifies stream subscribers after writes.
    pub snapshot_feed: Arc<SnapshotFeed>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            snapshot_feed: state.snapshot_feed.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Query parameters for the dashboard page.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Whether to overlay next-month forecasts on the spending chart.
    #[serde(default)]
    pub show_forecast: bool,
}

/// Form data for adding a transaction from the dashboard.
///
/// Amounts arrive as strings because that is what HTML number inputs submit.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// When the money was spent, as YYYY-MM-DD.
    pub date: String,
    /// The spending category.
    pub category: String,
    /// The amount of money spent.
    pub amount: String,
    /// An optional note about the transaction.
    #[serde(default)]
    pub description: String,
    /// Whether the dashboard was showing forecasts when the form was submitted.
    #[serde(default)]
    pub show_forecast: bool,
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    charts: [DashboardChart; 1],
    cards: Markup,
    table: Markup,
}

/// Display a page with the user's spending chart, forecasts and transactions.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
    HxRequest(is_htmx_request): HxRequest,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let data = build_dashboard_data(user_id.as_str(), query.show_forecast, &connection)?;

    // htmx requests come from the forecast toggle, which only swaps the
    // dashboard content. Everything else gets the full page.
    if is_htmx_request {
        Ok(dashboard_content_partial(today, query.show_forecast, data.as_ref()).into_response())
    } else {
        Ok(
            dashboard_view(user_id.as_str(), today, query.show_forecast, data.as_ref())
                .into_response(),
        )
    }
}

/// API endpoint to record a transaction and return the updated dashboard.
pub async fn post_dashboard_transaction(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let description = match form.description.trim() {
        "" => Value::Null,
        text => Value::String(text.to_owned()),
    };
    let payload = json!({
        "date": form.date,
        "category": form.category,
        "amount": form.amount,
        "description": description,
    });

    let new_transaction = match validate_payload(&payload) {
        Ok(new_transaction) => new_transaction,
        Err(details) => return Error::Validation(details).into_alert_response(),
    };

    // The lock is scoped so that it is not held across the publish await.
    let created = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        create_transaction(
            Transaction::build(
                user_id.as_str(),
                new_transaction.amount,
                new_transaction.date,
                &new_transaction.category,
            )
            .description(new_transaction.description),
            &connection,
        )
    };

    if let Err(error) = created {
        return error.into_alert_response();
    }

    if let Err(error) =
        publish_snapshot(&state.snapshot_feed, &state.db_connection, user_id.as_str()).await
    {
        tracing::error!("could not publish snapshot after create: {error}");
    }

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let data = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        match build_dashboard_data(user_id.as_str(), form.show_forecast, &connection) {
            Ok(data) => data,
            Err(error) => return error.into_alert_response(),
        }
    };

    dashboard_content_partial(today, form.show_forecast, data.as_ref()).into_response()
}

/// Fetches and builds all data needed for the dashboard display.
///
/// # Arguments
/// * `user_id` - The user whose transactions are shown
/// * `show_forecast` - Whether to compute next-month forecasts
/// * `connection` - Database connection
///
/// # Returns
/// All dashboard data ready for rendering, or `None` if the user has no
/// transactions yet.
///
/// # Errors
/// Returns error if database queries fail.
fn build_dashboard_data(
    user_id: &str,
    show_forecast: bool,
    connection: &Connection,
) -> Result<Option<DashboardData>, Error> {
    let transactions = list_transactions(user_id, connection)
        .inspect_err(|error| tracing::error!("could not list transactions: {error}"))?;

    if transactions.is_empty() {
        return Ok(None);
    }

    let sorted_months = get_sorted_months(&transactions);
    let month_labels = format_month_labels(&sorted_months);
    let spending = monthly_spending_by_category(&transactions, &sorted_months);
    let next_month = next_month_label(&sorted_months).unwrap_or_default();

    let predictions = if show_forecast {
        predict_spending(&spending)
    } else {
        Vec::new()
    };

    let charts = [DashboardChart {
        id: "spending-chart",
        options: spending_chart(
            &month_labels,
            &next_month,
            &spending,
            &predictions,
            show_forecast,
        )
        .to_string(),
    }];

    Ok(Some(DashboardData {
        charts,
        cards: prediction_cards_view(&predictions, &next_month),
        table: recent_transactions_table(&transactions),
    }))
}

/// Renders the form for recording a transaction without leaving the dashboard.
fn add_transaction_form(today: Date, show_forecast: bool) -> Markup {
    html!(
        section class="w-full mx-auto mb-4"
        {
            h3 class="text-xl font-semibold mb-4" { "Add transaction" }

            form
                hx-post=(endpoints::DASHBOARD_TRANSACTIONS)
                hx-target="#dashboard-content"
                hx-target-error="#alert-container"
                hx-swap="innerHTML"
                class="bg-gray-50 dark:bg-gray-800 p-4 rounded-lg
                    grid grid-cols-1 md:grid-cols-5 gap-4 items-end"
            {
                @if show_forecast {
                    input type="hidden" name="show_forecast" value="true";
                }

                div
                {
                    label
                        for="date"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Date"
                    }

                    input
                        name="date"
                        id="date"
                        type="date"
                        max=(today)
                        value=(today)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="category"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Category"
                    }

                    input
                        name="category"
                        id="category"
                        type="text"
                        placeholder="Groceries"
                        maxlength="150"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="amount"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Amount"
                    }

                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            placeholder="0.01"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label
                        for="description"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Description"
                    }

                    input
                        name="description"
                        id="description"
                        type="text"
                        placeholder="Description"
                        maxlength="1000"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add" }
            }
        }
    )
}

/// Renders the spending chart section with the forecast toggle.
fn spending_chart_section(charts: &[DashboardChart], show_forecast: bool) -> Markup {
    let (toggle_href, toggle_text) = if show_forecast {
        (
            endpoints::DASHBOARD_VIEW.to_owned(),
            "Hide next-month prediction",
        )
    } else {
        (
            format!("{}?show_forecast=true", endpoints::DASHBOARD_VIEW),
            "Show next-month prediction",
        )
    };

    html!(
        div class="flex justify-between flex-wrap items-center mb-4"
        {
            h3 class="text-xl font-semibold" { "Spending chart" }

            button
                hx-get=(toggle_href)
                hx-target="#dashboard-content"
                hx-target-error="#alert-container"
                hx-swap="innerHTML"
                class=(BUTTON_TEXT_STYLE)
            {
                (toggle_text)
            }
        }

        (charts_view(charts))
    )
}

/// Renders the prompt shown in place of the chart and table before the first
/// transaction is recorded.
fn no_data_view() -> Markup {
    html!(
        div class="flex flex-col items-center px-6 py-8 mx-auto"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "No chart data yet. Add transactions to see a chart."
            }
        }
    )
}

/// Renders everything inside the swappable dashboard container.
fn dashboard_content(today: Date, show_forecast: bool, data: Option<&DashboardData>) -> Markup {
    html!(
        (add_transaction_form(today, show_forecast))

        @match data {
            Some(data) => {
                (spending_chart_section(&data.charts, show_forecast))
                (data.cards)
                (data.table)
            }
            None => {
                (no_data_view())
            }
        }
    )
}

/// Renders the full dashboard page.
///
/// # Arguments
/// * `user_id` - The signed-in user, shown in the page header
/// * `today` - Today's date in the server's local timezone
/// * `show_forecast` - Whether forecasts are overlaid on the chart
/// * `data` - Dashboard data, or `None` when no transactions exist yet
fn dashboard_view(
    user_id: &str,
    today: Date,
    show_forecast: bool,
    data: Option<&DashboardData>,
) -> Markup {
    let content = html!(
        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl"
            {
                div class="flex justify-between flex-wrap items-end mb-4"
                {
                    h1 class="text-xl font-bold" { "Dashboard" }

                    div class="flex items-center gap-4"
                    {
                        span class="text-sm text-gray-600 dark:text-gray-400"
                        {
                            "Logged in as: " b { (user_id) }
                        }

                        a href=(endpoints::TRANSACTIONS_EXPORT) class=(LINK_STYLE)
                        {
                            "Export CSV"
                        }
                    }
                }

                div
                    id="dashboard-content"
                    class="flex flex-col px-2 lg:px-6 mx-auto
                        text-gray-900 dark:text-white"
                {
                    (dashboard_content(today, show_forecast, data))
                }
            }
        }
    );

    let mut scripts = vec![rupee_input_styles()];
    if let Some(data) = data {
        scripts.push(HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()));
        scripts.push(charts_script(&data.charts));
    }

    base("Dashboard", &scripts, &content)
}

/// Renders the updated dashboard content for HTMX updates.
///
/// This is used by the forecast toggle and the transaction form to update the
/// dashboard without requiring a full page reload. The chart initialization
/// script rides along inline because swapped-in content is added long after
/// `DOMContentLoaded` has fired.
fn dashboard_content_partial(
    today: Date,
    show_forecast: bool,
    data: Option<&DashboardData>,
) -> Markup {
    html!(
        (dashboard_content(today, show_forecast, data))

        @if let Some(data) = data {
            (charts_inline_script(&data.charts))
        }
    )
}
