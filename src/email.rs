//! A validated email address.

use std::fmt::Display;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::{Error, FieldErrors};

/// An email address that has been checked for the correct format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// Leading and trailing whitespace is removed before validation.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] for the `email` field
    /// if `raw_email` is not a valid email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = raw_email.trim();

        if EmailAddress::is_valid(email) {
            Ok(Self(email.to_owned()))
        } else {
            Err(Error::Validation(FieldErrors::single(
                "email",
                "Invalid email format",
            )))
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is a correctly formatted email address.
    /// For emails coming from the user (e.g., via the REST API), this function should **not** be used, instead use the checked version.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an incorrectly formatted email is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod email_tests {
    use crate::{Email, Error};

    #[test]
    fn create_email_success() {
        let email = Email::new("foo@bar.baz");

        assert_eq!(email, Ok(Email::new_unchecked("foo@bar.baz")));
    }

    #[test]
    fn create_email_trims_whitespace() {
        let email = Email::new("  foo@bar.baz\n");

        assert_eq!(email, Ok(Email::new_unchecked("foo@bar.baz")));
    }

    #[test]
    fn create_email_fails_with_no_at_symbol() {
        let email = Email::new("foobar.baz");

        assert!(matches!(email, Err(Error::Validation(errors)) if errors.get("email").is_some()));
    }

    #[test]
    fn create_email_fails_with_empty_string() {
        let email = Email::new("");

        assert!(matches!(email, Err(Error::Validation(_))));
    }
}
