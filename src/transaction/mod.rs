//! Transaction management for the expense tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and counting transactions
//! - Handlers for the JSON endpoints: create, list, delete, CSV export,
//!   monthly summary, and the live snapshot stream

mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod export_endpoint;
mod list_transactions_endpoint;
mod stream_endpoint;
mod summary_endpoint;

pub use core::{
    Transaction, TransactionBuilder, create_transaction, create_transaction_table,
    list_transactions,
};
pub use create_transaction_endpoint::{
    NewTransaction, create_transaction_endpoint, validate_payload,
};
pub use delete_transaction_endpoint::delete_transaction_endpoint;
pub use export_endpoint::export_transactions_endpoint;
pub use list_transactions_endpoint::{TransactionListBody, list_transactions_endpoint};
pub use stream_endpoint::transaction_stream_endpoint;
pub use summary_endpoint::monthly_summary_endpoint;

#[cfg(test)]
pub use core::{count_transactions, list_transactions_in_range};
