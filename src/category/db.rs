//! Database operations for categories.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    CategoryId, Error, UserId,
    category::{Category, CategoryName, CategoryType},
};

/// Create a category owned by `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns an [Error::DuplicateCategoryName] if the user already has a
/// category called `name`, or an [Error::SqlError] for other SQL errors.
pub fn create_category(
    user_id: UserId,
    name: CategoryName,
    kind: CategoryType,
    connection: &Connection,
) -> Result<Category, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO category (user_id, name, type, created_at) VALUES (?1, ?2, ?3, ?4);",
            (user_id.as_i64(), name.as_ref(), kind, created_at),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategoryName(name.to_string()),
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        kind,
        created_at,
    })
}

/// Retrieve the category `category_id` if it belongs to `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn get_category(
    user_id: UserId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, type, created_at FROM category
            WHERE id = :id AND user_id = :user_id;",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the categories owned by `user_id`, newest first.
pub fn get_categories(user_id: UserId, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, type, created_at FROM category
            WHERE user_id = :user_id
            ORDER BY id DESC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Delete the category `category_id` owned by `user_id`.
///
/// The category is only deleted if no transaction refers to it.
///
/// # Errors
///
/// Returns an:
/// - [Error::NotFound] if the user has no such category,
/// - [Error::CategoryInUse] if a transaction still refers to the category.
pub fn delete_category(
    user_id: UserId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category
        WHERE id = ?1 AND user_id = ?2
        AND NOT EXISTS (SELECT 1 FROM \"transaction\" WHERE category_id = ?1)",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected > 0 {
        return Ok(());
    }

    // Nothing was deleted, so either the category is missing or still in use.
    get_category(user_id, category_id, connection)?;

    Err(Error::CategoryInUse)
}

/// Initialize the category table.
///
/// Category names are unique per user.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('INCOME', 'EXPENSE')),
            created_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let kind = row.get(2)?;
    let created_at = row.get(3)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        kind,
        created_at,
    })
}
