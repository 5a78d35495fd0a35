//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::DatabaseId};

// ============================================================================
// MODELS
// ============================================================================

/// A single expense: money spent on a category on a particular day.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The ID of the user that recorded this transaction.
    ///
    /// Transactions are only ever visible to their owning user.
    pub user_id: String,
    /// When the money was spent.
    pub date: Date,
    /// The spending category, e.g. "Groceries", "Transport", "Rent".
    pub category: String,
    /// The amount of money spent in this transaction.
    pub amount: f64,
    /// An optional note about what the transaction was for.
    pub description: Option<String>,
    /// When the transaction was recorded, as opposed to when the money was
    /// spent.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(user_id: &str, amount: f64, date: Date, category: &str) -> TransactionBuilder {
        TransactionBuilder {
            user_id: user_id.to_owned(),
            amount,
            date,
            category: category.to_owned(),
            description: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Holds everything the caller provides; the ID and creation timestamp are
/// assigned by [create_transaction].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The ID of the user that owns the transaction.
    pub user_id: String,

    /// The monetary amount of the transaction.
    ///
    /// # Examples
    /// - `45.99` - Coffee beans
    /// - `1200.00` - Rent payment
    pub amount: f64,

    /// The date when the money was spent.
    ///
    /// This represents the actual transaction date, not when it was recorded
    /// in the system.
    pub date: Date,

    /// The spending category.
    ///
    /// Leading and trailing whitespace is stripped before the transaction is
    /// stored.
    pub category: String,

    /// An optional note about the transaction.
    ///
    /// # Examples
    /// - `"Weekly shop at PAK'nSAVE"`
    /// - `"Split bill with flatmates"`
    pub description: Option<String>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// The category and description are trimmed, and the creation timestamp is
/// set to the current UTC time.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let created_at = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, date, category, amount, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, user_id, date, category, amount, description, created_at",
        )?
        .query_row(
            (
                builder.user_id,
                builder.date,
                builder.category.trim(),
                builder.amount,
                builder.description.as_deref().map(str::trim),
                created_at,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get all of a user's transactions, most recent first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_transactions(user_id: &str, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    // Sort by date, and then ID so that the order is stable when transactions
    // share a date.
    connection
        .prepare(
            "SELECT id, user_id, date, category, amount, description, created_at
             FROM \"transaction\"
             WHERE user_id = ?1
             ORDER BY date DESC, id DESC",
        )?
        .query_map([user_id], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Get a user's transactions dated within the inclusive range `[start, end]`,
/// oldest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_transactions_in_range(
    user_id: &str,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, date, category, amount, description, created_at
             FROM \"transaction\"
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date ASC, id ASC",
        )?
        .query_map(params![user_id, start, end], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Get the number of transactions a user has recorded.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(user_id: &str, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used by the list and summary queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let date = row.get(2)?;
    let category = row.get(3)?;
    let amount = row.get(4)?;
    let description = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(Transaction {
        id,
        user_id,
        date,
        category,
        amount,
        description,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        db::initialize,
        transaction::{
            Transaction, count_transactions, create_transaction, list_transactions,
            list_transactions_in_range,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let amount = 12.3;

        let result = create_transaction(
            Transaction::build("alice", amount, date!(2025 - 10 - 05), "Groceries"),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, amount);
                assert_eq!(transaction.user_id, "alice");
                assert_eq!(transaction.category, "Groceries");
                assert_eq!(transaction.description, None);
                assert!(transaction.created_at <= OffsetDateTime::now_utc());
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_trims_category_and_description() {
        let conn = get_test_connection();

        let transaction = create_transaction(
            Transaction::build("alice", 9.99, date!(2025 - 10 - 05), "  Groceries ")
                .description(Some("  weekly shop ".to_owned())),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.category, "Groceries");
        assert_eq!(transaction.description, Some("weekly shop".to_owned()));
    }

    #[test]
    fn list_returns_newest_first() {
        let conn = get_test_connection();
        create_transaction(
            Transaction::build("alice", 1.0, date!(2025 - 10 - 01), "Groceries"),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build("alice", 2.0, date!(2025 - 10 - 03), "Transport"),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build("alice", 3.0, date!(2025 - 10 - 03), "Groceries"),
            &conn,
        )
        .unwrap();

        let transactions = list_transactions("alice", &conn).expect("Could not list transactions");

        let amounts: Vec<f64> = transactions
            .iter()
            .map(|transaction| transaction.amount)
            .collect();
        assert_eq!(amounts, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn list_in_range_is_inclusive_and_oldest_first() {
        let conn = get_test_connection();
        for (amount, date) in [
            (1.0, date!(2025 - 09 - 30)),
            (2.0, date!(2025 - 10 - 31)),
            (3.0, date!(2025 - 10 - 01)),
            (4.0, date!(2025 - 11 - 01)),
        ] {
            create_transaction(Transaction::build("alice", amount, date, "Groceries"), &conn)
                .unwrap();
        }
        create_transaction(
            Transaction::build("bob", 5.0, date!(2025 - 10 - 15), "Groceries"),
            &conn,
        )
        .unwrap();

        let transactions = list_transactions_in_range(
            "alice",
            date!(2025 - 10 - 01),
            date!(2025 - 10 - 31),
            &conn,
        )
        .expect("Could not list transactions");

        let amounts: Vec<f64> = transactions
            .iter()
            .map(|transaction| transaction.amount)
            .collect();
        assert_eq!(amounts, vec![3.0, 2.0]);
    }

    #[test]
    fn list_only_returns_the_users_transactions() {
        let conn = get_test_connection();
        create_transaction(
            Transaction::build("alice", 1.0, date!(2025 - 10 - 01), "Groceries"),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build("bob", 2.0, date!(2025 - 10 - 02), "Groceries"),
            &conn,
        )
        .unwrap();

        let transactions = list_transactions("alice", &conn).expect("Could not list transactions");

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].user_id, "alice");
    }

    #[test]
    fn get_count_is_scoped_to_user() {
        let conn = get_test_connection();
        let today = date!(2025 - 10 - 05);
        let want_count = 20;
        for i in 1..=want_count {
            create_transaction(Transaction::build("alice", i as f64, today, "Groceries"), &conn)
                .expect("Could not create transaction");
        }
        create_transaction(Transaction::build("bob", 1.0, today, "Groceries"), &conn)
            .expect("Could not create transaction");

        let got_count = count_transactions("alice", &conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }
}
