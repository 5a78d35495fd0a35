//! Database set-up shared by the server binary and tests.

use rusqlite::Connection;

use crate::{Error, transaction::create_transaction_table};

/// Creates the tables and indexes used by the application.
///
/// Existing tables are left untouched, so this is safe to call on every
/// start-up.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "journal_mode", "WAL")?;

    create_transaction_table(connection)?;

    Ok(())
}
