//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Email, Error, FieldErrors, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The minimum number of characters in a user's display name.
pub const USER_NAME_MIN_LENGTH: usize = 2;

/// A user's display name with at least [USER_NAME_MIN_LENGTH] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    /// Create a display name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] for the `name` field
    /// if the trimmed name is shorter than [USER_NAME_MIN_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.chars().count() < USER_NAME_MIN_LENGTH {
            Err(Error::Validation(FieldErrors::single(
                "name",
                format!("Name must be at least {USER_NAME_MIN_LENGTH} characters"),
            )))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a display name without validation.
    ///
    /// The caller should ensure that the name is long enough.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user of the application.
///
/// This type holds the password hash and must never be sent to clients,
/// use [Identity] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's display name.
    pub name: UserName,
    /// The email address the user logs in with.
    pub email: Email,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

impl User {
    /// The public part of the user that may be shared with the client.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Who the caller is, as resolved from a session token.
///
/// This is the only representation of a user that leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's display name.
    pub name: UserName,
    /// The email address the user logs in with.
    pub email: Email,
}

/// Create the user table.
///
/// Email addresses are unique regardless of letter case.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    name: UserName,
    email: Email,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (name, email, password) VALUES (?1, ?2, ?3)",
        (name.as_ref(), email.as_ref(), password_hash.as_ref()),
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name,
        email,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, name, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user with the email address `email`, ignoring letter case.
///
/// # Errors
///
/// This function will return an [Error::NotFound] if no user has the email
/// address, or an [Error::SqlError] if the query failed.
pub fn get_user_by_email(email: &Email, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, name, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email.as_ref())], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserId::new(raw_id),
        name: UserName::new_unchecked(&raw_name),
        email: Email::new_unchecked(&raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
