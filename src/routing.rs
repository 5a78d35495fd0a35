//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tower_http::services::ServeDir;

use crate::{
    AppState, Error,
    auth::auth_guard,
    dashboard::{get_dashboard_page, post_dashboard_transaction},
    endpoints,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, export_transactions_endpoint,
        list_transactions_endpoint, monthly_summary_endpoint, transaction_stream_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::ROOT, get(get_health_check));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(list_transactions_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(
            endpoints::TRANSACTIONS_EXPORT,
            get(export_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_STREAM,
            get(transaction_stream_endpoint),
        )
        .route(endpoints::SUMMARY, get(monthly_summary_endpoint))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(
            endpoints::DASHBOARD_TRANSACTIONS,
            post(post_dashboard_transaction),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Report that the server is up and reachable.
async fn get_health_check() -> Json<Value> {
    Json(json!({"ok": true, "message": "Backend is running ✔"}))
}

/// Serve the standard JSON error body for paths outside the API.
async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, endpoints, endpoints::format_endpoint};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        let state =
            AppState::new(connection, None, true, "Etc/UTC").expect("Could not create app state.");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn health_check_does_not_require_auth() {
        let server = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["ok"], true);
        assert_eq!(body["message"], "Backend is running ✔");
    }

    #[tokio::test]
    async fn protected_routes_reject_unauthenticated_requests() {
        let server = get_test_server();

        for path in [
            endpoints::TRANSACTIONS,
            endpoints::TRANSACTIONS_EXPORT,
            endpoints::TRANSACTIONS_STREAM,
            endpoints::SUMMARY,
            endpoints::DASHBOARD_VIEW,
        ] {
            let response = server.get(path).await;

            response.assert_status_unauthorized();
            let body: Value = response.json();
            assert_eq!(body["ok"], false, "GET {path} should be rejected");
        }

        let response = server.post(endpoints::TRANSACTIONS).await;
        response.assert_status_unauthorized();

        let response = server.post(endpoints::DASHBOARD_TRANSACTIONS).await;
        response.assert_status_unauthorized();

        let response = server
            .delete(&format_endpoint(endpoints::TRANSACTION, 1))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn unknown_routes_get_a_json_not_found() {
        let server = get_test_server();

        let response = server.get("/no/such/route").await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn dev_user_can_record_and_review_spending_end_to_end() {
        let server = get_test_server();

        let created = server
            .post(endpoints::TRANSACTIONS)
            .add_header("x-user-id", "alice")
            .json(&json!({
                "date": "2025-10-02",
                "category": "Groceries",
                "amount": 12.5,
                "description": "weekly shop",
            }))
            .await;

        created.assert_status(StatusCode::CREATED);
        let body: Value = created.json();
        assert_eq!(body["ok"], true);
        assert_eq!(body["transaction"]["category"], "Groceries");
        let transaction_id = body["transaction"]["id"].as_i64().unwrap();

        let listed = server
            .get(endpoints::TRANSACTIONS)
            .add_header("x-user-id", "alice")
            .await;

        listed.assert_status_ok();
        let body: Value = listed.json();
        assert_eq!(body["transactions"].as_array().unwrap().len(), 1);

        let summary = server
            .get(endpoints::SUMMARY)
            .add_query_param("month", "2025-10")
            .add_header("x-user-id", "alice")
            .await;

        summary.assert_status_ok();
        let body: Value = summary.json();
        assert_eq!(body["month"], "2025-10");
        assert_eq!(body["total"], 12.5);
        assert_eq!(body["totalsByCategory"]["Groceries"], 12.5);

        let dashboard = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_header("x-user-id", "alice")
            .await;

        dashboard.assert_status_ok();
        assert!(dashboard.text().contains("Dashboard"));

        let exported = server
            .get(endpoints::TRANSACTIONS_EXPORT)
            .add_header("x-user-id", "alice")
            .await;

        exported.assert_status_ok();
        assert!(exported.text().contains("\"Groceries\""));

        let deleted = server
            .delete(&format_endpoint(endpoints::TRANSACTION, transaction_id))
            .add_header("x-user-id", "alice")
            .await;

        deleted.assert_status_ok();

        let listed = server
            .get(endpoints::TRANSACTIONS)
            .add_header("x-user-id", "alice")
            .await;

        let body: Value = listed.json();
        assert!(body["transactions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn users_cannot_see_each_others_transactions() {
        let server = get_test_server();

        let created = server
            .post(endpoints::TRANSACTIONS)
            .add_header("x-user-id", "alice")
            .json(&json!({
                "date": "2025-10-02",
                "category": "Groceries",
                "amount": 12.5,
            }))
            .await;
        created.assert_status(StatusCode::CREATED);

        let listed = server
            .get(endpoints::TRANSACTIONS)
            .add_header("x-user-id", "bob")
            .await;

        listed.assert_status_ok();
        let body: Value = listed.json();
        assert!(body["transactions"].as_array().unwrap().is_empty());
    }
}
