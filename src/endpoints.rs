//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}',
//! use [format_endpoint].

/// The health check route, the only route that does not require auth.
pub const ROOT: &str = "/";
/// The page displaying the entry form, spending chart and transaction table.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The route the dashboard entry form posts to.
pub const DASHBOARD_TRANSACTIONS: &str = "/dashboard/transactions";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create or list transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route to download all transactions as a CSV file.
pub const TRANSACTIONS_EXPORT: &str = "/transactions/export";
/// The route streaming transaction list snapshots as server-sent events.
pub const TRANSACTIONS_STREAM: &str = "/transactions/stream";
/// The route for the monthly spending summary.
pub const SUMMARY: &str = "/summary";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
