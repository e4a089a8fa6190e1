//! Reads the multipart form for creating a transaction.

use axum::extract::Multipart;
use time::OffsetDateTime;

use crate::{
    Error, FieldErrors,
    transaction::{Amount, Description, NewTransaction, parse_category_id, parse_date},
    upload::{IMAGE_FIELD, UploadedImage, multipart_error, read_image},
};

/// The raw text fields of a create transaction request and its image.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionForm {
    /// The value of the transaction, e.g. "50000".
    pub amount: String,
    /// Text detailing the transaction.
    pub description: String,
    /// The ID of the category, as text.
    pub category_id: String,
    /// When the transaction happened; blank means now.
    pub date: String,
    /// The receipt image, if one was sent.
    pub image: Option<UploadedImage>,
}

impl TransactionForm {
    /// Read every field of `multipart`.
    ///
    /// Image problems are collected into `errors` instead of ending the read,
    /// so that they are reported alongside the other fields.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if the body is not a well-formed
    /// multipart form.
    pub async fn read(multipart: &mut Multipart, errors: &mut FieldErrors) -> Result<Self, Error> {
        let mut form = TransactionForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                IMAGE_FIELD if form.image.is_some() => {
                    errors.add(IMAGE_FIELD, "Only one image may be uploaded");
                }
                IMAGE_FIELD => {
                    form.image = errors.record(read_image(field).await)?.flatten();
                }
                "amount" => form.amount = field.text().await.map_err(multipart_error)?,
                "description" => form.description = field.text().await.map_err(multipart_error)?,
                "categoryId" => form.category_id = field.text().await.map_err(multipart_error)?,
                "date" => form.date = field.text().await.map_err(multipart_error)?,
                _ => tracing::debug!("Ignoring unexpected form field \"{name}\""),
            }
        }

        Ok(form)
    }

    /// Validate the text fields, adding any problems to `errors`.
    ///
    /// Returns the transaction without an image reference, or `None` if any
    /// field was invalid.
    ///
    /// # Errors
    ///
    /// Errors other than validation errors are returned as is.
    pub fn validate(
        &self,
        now: OffsetDateTime,
        errors: &mut FieldErrors,
    ) -> Result<Option<NewTransaction>, Error> {
        let amount = errors.record(Amount::parse(&self.amount))?;
        let description = errors.record(Description::new(&self.description))?;
        let category_id = errors.record(parse_category_id(&self.category_id))?;
        let date = errors.record(parse_date(&self.date, now))?;

        match (amount, description, category_id, date) {
            (Some(amount), Some(description), Some(category_id), Some(date))
                if errors.is_empty() =>
            {
                Ok(Some(NewTransaction {
                    amount,
                    description,
                    category_id,
                    date,
                    image_url: None,
                }))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod validate_tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::FieldErrors;

    use super::TransactionForm;

    fn form() -> TransactionForm {
        TransactionForm {
            amount: "50000".to_owned(),
            description: "Lunch".to_owned(),
            category_id: "3".to_owned(),
            date: "2025-04-01".to_owned(),
            image: None,
        }
    }

    #[test]
    fn valid_form_produces_transaction() {
        let mut errors = FieldErrors::new();

        let transaction = form()
            .validate(OffsetDateTime::now_utc(), &mut errors)
            .unwrap()
            .expect("form should be valid");

        assert!(errors.is_empty());
        assert_eq!(transaction.amount.as_f64(), 50000.0);
        assert_eq!(transaction.description.as_ref(), "Lunch");
        assert_eq!(transaction.category_id, 3);
        assert_eq!(transaction.date, datetime!(2025-04-01 00:00 UTC));
        assert_eq!(transaction.image_url, None);
    }

    #[test]
    fn missing_date_is_now() {
        let now = OffsetDateTime::now_utc();
        let mut errors = FieldErrors::new();

        let transaction = TransactionForm {
            date: String::new(),
            ..form()
        }
        .validate(now, &mut errors)
        .unwrap()
        .unwrap();

        assert_eq!(transaction.date, now);
    }

    #[test]
    fn reports_every_invalid_field() {
        let mut errors = FieldErrors::new();

        let transaction = TransactionForm::default()
            .validate(OffsetDateTime::now_utc(), &mut errors)
            .unwrap();

        assert_eq!(transaction, None);
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["amount", "categoryId", "description"]
        );
    }

    #[test]
    fn earlier_errors_prevent_transaction() {
        let mut errors = FieldErrors::single("image", "Images only!");

        let transaction = form()
            .validate(OffsetDateTime::now_utc(), &mut errors)
            .unwrap();

        assert_eq!(transaction, None);
    }
}
