//! Defines the core data models for transactions and the validation of their fields.

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    CategoryId, Error, FieldErrors, TransactionId,
    category::{Category, CategoryName, CategoryType},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Whether money was spent or earned is decided by the type of its category,
/// so the amount is always positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// The reference to the receipt image, e.g. `uploads/image-1729238400123456789.jpg`.
    pub image_url: Option<String>,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The name and type of a transaction's category, as shown in transaction lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// The name of the category.
    pub name: CategoryName,
    /// Whether the category is for income or expenses.
    #[serde(rename = "type")]
    pub kind: CategoryType,
}

/// A transaction with a summary of its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListItem {
    /// The transaction.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The transaction's category.
    pub category: CategorySummary,
}

/// A transaction with its full category record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    /// The transaction.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The transaction's category.
    pub category: Category,
}

/// The validated fields of a transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// How much money was spent or earned.
    pub amount: Amount,
    /// What the transaction was for.
    pub description: Description,
    /// The category, which must belong to the user creating the transaction.
    pub category_id: CategoryId,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// The reference to the stored receipt image, if any.
    pub image_url: Option<String>,
}

// ============================================================================
// FIELD VALIDATION
// ============================================================================

/// A finite amount of money greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    /// Create an amount.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for the `amount` field unless `amount`
    /// is finite and positive.
    pub fn new(amount: f64) -> Result<Self, Error> {
        if amount.is_finite() && amount > 0.0 {
            Ok(Self(amount))
        } else {
            Err(amount_error())
        }
    }

    /// Parse an amount from form text such as "50000" or "12.5".
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for the `amount` field if the text is
    /// not a number or the number is not positive.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| amount_error())
            .and_then(Self::new)
    }

    /// The amount as a float.
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

fn amount_error() -> Error {
    Error::Validation(FieldErrors::single(
        "amount",
        "Amount must be a positive number",
    ))
}

/// A non-empty description of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(String);

impl Description {
    /// Create a description, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for the `description` field if the
    /// description is empty or only whitespace.
    pub fn new(description: &str) -> Result<Self, Error> {
        let description = description.trim();

        if description.is_empty() {
            Err(Error::Validation(FieldErrors::single(
                "description",
                "Description is required",
            )))
        } else {
            Ok(Self(description.to_owned()))
        }
    }
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a category ID sent as form text.
///
/// # Errors
///
/// Returns an [Error::Validation] for the `categoryId` field if the text is
/// not an integer.
pub fn parse_category_id(raw: &str) -> Result<CategoryId, Error> {
    raw.trim().parse().map_err(|_| {
        Error::Validation(FieldErrors::single(
            "categoryId",
            "Category ID must be an integer",
        ))
    })
}

/// Parse the date of a transaction, converted to UTC.
///
/// Blank text means "now". Otherwise the text must be an RFC 3339 date-time
/// or a `YYYY-MM-DD` date, which is taken as midnight UTC.
///
/// # Errors
///
/// Returns an [Error::Validation] for the `date` field if non-blank text is
/// in neither format.
pub fn parse_date(raw: &str, now: OffsetDateTime) -> Result<OffsetDateTime, Error> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Ok(now.to_offset(UtcOffset::UTC));
    }

    if let Ok(date_time) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(date_time.to_offset(UtcOffset::UTC));
    }

    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| {
            Error::Validation(FieldErrors::single(
                "date",
                "Date must be a valid date, e.g. 2025-04-01",
            ))
        })
}

#[cfg(test)]
mod amount_tests {
    use crate::Error;

    use super::Amount;

    #[test]
    fn parses_positive_numbers() {
        assert_eq!(Amount::parse("50000").unwrap().as_f64(), 50000.0);
        assert_eq!(Amount::parse(" 12.5 ").unwrap().as_f64(), 12.5);
    }

    #[test]
    fn rejects_zero_negative_and_non_numbers() {
        for raw in ["0", "-5", "", "abc", "NaN", "inf"] {
            let result = Amount::parse(raw);

            assert!(
                matches!(result, Err(Error::Validation(ref errors)) if errors.get("amount").is_some()),
                "want a validation error for {raw:?}, got {result:?}"
            );
        }
    }
}


#[cfg(test)]
mod parse_tests {
    use time::{
        OffsetDateTime,
        macros::{datetime, offset},
    };

    use crate::Error;

    use super::{parse_category_id, parse_date};

    #[test]
    fn category_id_must_be_integer() {
        assert_eq!(parse_category_id("42"), Ok(42));

        for raw in ["", "4.2", "food"] {
            assert!(
                matches!(parse_category_id(raw), Err(Error::Validation(errors)) if errors.get("categoryId").is_some())
            );
        }
    }

    #[test]
    fn blank_date_is_now() {
        let now = OffsetDateTime::now_utc();

        assert_eq!(parse_date("", now), Ok(now));
        assert_eq!(parse_date("   ", now), Ok(now));
    }

    #[test]
    fn parses_calendar_date_as_midnight_utc() {
        let now = OffsetDateTime::now_utc();

        assert_eq!(
            parse_date("2025-04-01", now),
            Ok(datetime!(2025-04-01 00:00 UTC))
        );
    }

    #[test]
    fn parses_rfc3339_and_converts_to_utc() {
        let now = OffsetDateTime::now_utc();

        let date = parse_date("2025-04-01T09:30:00+13:00", now).unwrap();

        assert_eq!(date, datetime!(2025-03-31 20:30 UTC));
        assert_eq!(date.offset(), offset!(UTC));
    }

    #[test]
    fn rejects_unparseable_date() {
        let now = OffsetDateTime::now_utc();

        let result = parse_date("next tuesday", now);

        assert!(matches!(result, Err(Error::Validation(errors)) if errors.get("date").is_some()));
    }
}
