//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create all of the database tables for the application.
///
/// Foreign key enforcement is switched on for `connection`, since category
/// ownership and the in-use check for categories rely on it.
///
/// # Errors
/// This function may return a [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must be set first.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
