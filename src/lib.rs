//! [![github]](https://github.com/AnthonyDickson/expensetrack-rs)&ensp;
//!
//! [github]: https://img.shields.io/badge/github-8da0cb?style=for-the-badge&labelColor=555555&logo=github
//!
//! <br>
//!
//! ExpenseTrack is a web app for recording day-to-day spending and predicting
//! what each category will cost next month.
//!
//! This library provides a JSON REST API plus a server-rendered dashboard.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod events;
mod html;
mod routing;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use auth::{HttpTokenVerifier, TokenVerifier};
pub use db::initialize as initialize_db;
pub use routing::build_router;

use crate::html::alert_error;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// A single field that failed request validation.
///
/// Serialized into the `details` array of a 400 response so that API clients
/// can show per-field feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// The name of the request field that failed validation.
    pub field: &'static str,
    /// What the field must look like to be accepted.
    pub message: &'static str,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request had no `Authorization: Bearer <token>` header while token
    /// verification was configured.
    #[error("Missing Authorization Bearer token")]
    MissingBearerToken,

    /// The presented bearer token was rejected by the identity service, or the
    /// service could not be reached.
    #[error("Invalid auth")]
    InvalidAuthToken,

    /// The server is running in production mode without an identity service
    /// configured, so no request can be authenticated.
    #[error("Auth not configured in production")]
    AuthNotConfigured,

    /// The request had no `x-user-id` header while the server was running in
    /// dev mode.
    #[error("Missing x-user-id header (dev mode)")]
    MissingDevUserHeader,

    /// One or more request fields failed validation.
    ///
    /// Each offending field is reported separately so the client can highlight
    /// them all in one round trip.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// A CSV export was requested while the user has no transactions.
    #[error("No data to export")]
    EmptyExport,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A transaction row could not be serialized as CSV.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingBearerToken
            | Error::InvalidAuthToken
            | Error::AuthNotConfigured
            | Error::MissingDevUserHeader => StatusCode::UNAUTHORIZED,
            Error::Validation(_) | Error::EmptyExport => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::SqlError(_)
            | Error::CsvError(_)
            | Error::JSONSerializationError(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error as an HTML alert for HTMX requests from the dashboard.
    fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);

            return (
                status_code,
                alert_error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                    &[],
                ),
            )
                .into_response();
        }

        match self {
            Error::Validation(details) => {
                let messages: Vec<String> = details
                    .iter()
                    .map(|detail| format!("{}: {}", detail.field, detail.message))
                    .collect();

                (
                    status_code,
                    alert_error(
                        "Could not add transaction",
                        "Some fields were not filled in correctly.",
                        &messages,
                    ),
                )
                    .into_response()
            }
            Error::EmptyExport => (
                status_code,
                alert_error("Nothing to export", "Add some transactions first.", &[]),
            )
                .into_response(),
            error => (
                error.status_code(),
                alert_error("Request failed", &error.to_string(), &[]),
            )
                .into_response(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        let body = match &self {
            Error::Validation(details) => json!({
                "ok": false,
                "error": self.to_string(),
                "details": details,
            }),
            _ => json!({
                "ok": false,
                "error": self.to_string(),
            }),
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, FieldError};

    #[tokio::test]
    async fn validation_error_lists_each_field() {
        let error = Error::Validation(vec![
            FieldError {
                field: "date",
                message: "date must be YYYY-MM-DD",
            },
            FieldError {
                field: "amount",
                message: "amount must be a number",
            },
        ]);

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["details"][0]["field"], "date");
        assert_eq!(json["details"][0]["message"], "date must be YYYY-MM-DD");
        assert_eq!(json["details"][1]["field"], "amount");
    }

    #[tokio::test]
    async fn auth_errors_use_unauthorized_status() {
        for error in [
            Error::MissingBearerToken,
            Error::InvalidAuthToken,
            Error::AuthNotConfigured,
            Error::MissingDevUserHeader,
        ] {
            let response = error.into_response();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn not_found_reports_missing_resource() {
        let response = Error::NotFound.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["ok"], false);
    }
}
