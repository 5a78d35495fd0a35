//! Dashboard module
//!
//! Provides the server-rendered overview page: a transaction entry form, the
//! monthly spending chart with optional next-month forecasts, forecast cards,
//! and the recent transactions table.

mod aggregation;
mod cards;
mod charts;
mod forecast;
mod handlers;
mod tables;

pub use handlers::{get_dashboard_page, post_dashboard_transaction};
