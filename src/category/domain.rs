//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{CategoryId, Error, FieldErrors};

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] for the `name` field
    /// if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::Validation(FieldErrors::single(
                "name",
                "Category name is required",
            )))
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether money in a category is earned or spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryType {
    /// Money coming in, e.g. wages.
    Income,
    /// Money going out, e.g. groceries.
    Expense,
}

impl CategoryType {
    /// The name used for the type in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "INCOME",
            CategoryType::Expense => "EXPENSE",
        }
    }
}

impl FromStr for CategoryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOME" => Ok(CategoryType::Income),
            "EXPENSE" => Ok(CategoryType::Expense),
            _ => Err(Error::Validation(FieldErrors::single(
                "type",
                "Type must be INCOME or EXPENSE",
            ))),
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A category for expenses or income, e.g., 'Groceries', 'Eating Out', 'Wages'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category, unique among the owner's categories.
    pub name: CategoryName,
    /// Whether the category is for income or expenses.
    #[serde(rename = "type")]
    pub kind: CategoryType,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Request body for creating a category.
///
/// Missing fields deserialize as empty strings so that they are reported as
/// validation errors rather than as a malformed body.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    /// The name of the new category.
    pub name: String,
    /// Either "INCOME" or "EXPENSE".
    #[serde(rename = "type")]
    pub kind: String,
}

#[cfg(test)]
mod category_name_tests {
    use crate::{CategoryName, Error};

    #[test]
    fn new_fails_on_empty_string() {
        let category_name = CategoryName::new("");

        assert!(matches!(category_name, Err(Error::Validation(_))));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let category_name = CategoryName::new("\n\t \r");

        assert!(matches!(category_name, Err(Error::Validation(_))));
    }

    #[test]
    fn new_succeeds_on_non_empty_string() {
        let category_name = CategoryName::new("🔥");

        assert!(category_name.is_ok())
    }
}
