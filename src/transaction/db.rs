//! Database queries for transactions.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error, TransactionId, UserId,
    category::{Category, CategoryName},
    transaction::{
        CategorySummary, NewTransaction, Transaction, TransactionDetail, TransactionListItem,
    },
};

/// Create a new transaction for `user_id` in the database.
///
/// The category must belong to the same user. The ownership check and the
/// insert are a single statement.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidCategory] if `category_id` does not refer to one of the user's categories,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserId,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let created_at = OffsetDateTime::now_utc();

    let rows_affected = connection.execute(
        "INSERT INTO \"transaction\"
            (user_id, category_id, amount, description, date, image_url, created_at)
        SELECT ?1, id, ?2, ?3, ?4, ?5, ?6
        FROM category
        WHERE id = ?7 AND user_id = ?1",
        (
            user_id.as_i64(),
            new_transaction.amount.as_f64(),
            new_transaction.description.as_ref(),
            new_transaction.date,
            new_transaction.image_url.as_deref(),
            created_at,
            new_transaction.category_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::InvalidCategory(new_transaction.category_id));
    }

    Ok(Transaction {
        id: connection.last_insert_rowid(),
        amount: new_transaction.amount.as_f64(),
        description: new_transaction.description.as_ref().to_owned(),
        date: new_transaction.date,
        image_url: new_transaction.image_url,
        category_id: new_transaction.category_id,
        created_at,
    })
}

/// Retrieve the transactions of `user_id` with a summary of each one's
/// category, most recent date first.
///
/// Dates are stored in UTC, so their text sorts in time order.
///
/// # Errors
///
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<TransactionListItem>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.amount, t.description, t.date, t.image_url, t.category_id, t.created_at,
                c.name, c.type
            FROM \"transaction\" t
            INNER JOIN category c ON c.id = t.category_id
            WHERE t.user_id = :user_id
            ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            let transaction = map_transaction_row(row)?;
            let raw_name: String = row.get(7)?;

            Ok(TransactionListItem {
                transaction,
                category: CategorySummary {
                    name: CategoryName::new_unchecked(&raw_name),
                    kind: row.get(8)?,
                },
            })
        })?
        .map(|maybe_item| maybe_item.map_err(Error::from))
        .collect()
}

/// Retrieve a transaction of `user_id` with its full category.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    user_id: UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<TransactionDetail, Error> {
    connection
        .prepare(
            "SELECT t.id, t.amount, t.description, t.date, t.image_url, t.category_id, t.created_at,
                c.name, c.type, c.created_at
            FROM \"transaction\" t
            INNER JOIN category c ON c.id = t.category_id
            WHERE t.id = :id AND t.user_id = :user_id",
        )?
        .query_row(&[(":id", &id), (":user_id", &user_id.as_i64())], |row| {
            let transaction = map_transaction_row(row)?;
            let raw_name: String = row.get(7)?;
            let category = Category {
                id: transaction.category_id,
                name: CategoryName::new_unchecked(&raw_name),
                kind: row.get(8)?,
                created_at: row.get(9)?,
            };

            Ok(TransactionDetail {
                transaction,
                category,
            })
        })
        .map_err(|error| error.into())
}

/// Delete a transaction of `user_id`. The receipt image is left in place.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    user_id: UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the transaction table.
///
/// A category cannot be deleted while a transaction refers to it.
///
/// # Errors
///
/// Returns an error if the table could not be created.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            image_url TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
///
/// Expects the columns id, amount, description, date, image_url, category_id
/// and created_at, in that order, starting at index 0.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        image_url: row.get(4)?,
        category_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}
