//! A typed HTTP client for the Frugal Ledger API.

use std::path::Path;

use reqwest::{
    Response, StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    AuthResponse, Category, CategoryForm, CategoryId, FieldErrors, IMAGE_FIELD, LogInForm,
    RegisterForm, Transaction, TransactionDetail, TransactionId, TransactionListItem,
    client::ClientError,
    endpoints::{self, format_endpoint},
};

/// The fields for creating a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransactionRequest {
    /// How much money was spent or earned.
    pub amount: f64,
    /// What the transaction was for.
    pub description: String,
    /// The category of the transaction.
    pub category_id: CategoryId,
    /// When the transaction happened, e.g. "2025-04-01". The server uses the
    /// current time when this is `None`.
    pub date: Option<String>,
    /// A photo of the receipt.
    pub image: Option<ReceiptImage>,
}

/// An image file to upload with a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptImage {
    /// The name of the file including its extension, e.g. "receipt.jpg".
    pub file_name: String,
    /// The MIME type of the file, e.g. "image/jpeg".
    pub content_type: String,
    /// The contents of the file.
    pub bytes: Vec<u8>,
}

impl ReceiptImage {
    /// Read the image at `path`, guessing its MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|extension| extension.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let content_type = match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            _ => "application/octet-stream",
        };

        Ok(Self {
            file_name,
            content_type: content_type.to_owned(),
            bytes,
        })
    }
}

/// The body of an unsuccessful response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
    errors: Option<FieldErrors>,
}

/// The body of a successful delete.
#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

/// Sends requests to a Frugal Ledger server and decodes its responses.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the server at `base_url`, e.g. "http://localhost:5000".
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http: reqwest::Client::new(),
        }
    }

    /// The server the client sends requests to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The full URL of a stored receipt image, e.g. `uploads/image-1.jpg`.
    pub fn receipt_url(&self, image_url: &str) -> String {
        format!("{}/{}", self.base_url, image_url.trim_start_matches('/'))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Register a new user.
    pub async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ClientError> {
        let response = self
            .http
            .post(self.url(endpoints::REGISTER))
            .json(form)
            .send()
            .await?;

        decode(response).await
    }

    /// Log in an existing user.
    pub async fn log_in(&self, form: &LogInForm) -> Result<AuthResponse, ClientError> {
        let response = self
            .http
            .post(self.url(endpoints::LOG_IN))
            .json(form)
            .send()
            .await?;

        decode(response).await
    }

    /// The categories of the user that `token` belongs to.
    pub async fn categories(&self, token: &str) -> Result<Vec<Category>, ClientError> {
        let response = self
            .http
            .get(self.url(endpoints::CATEGORIES))
            .bearer_auth(token)
            .send()
            .await?;

        decode(response).await
    }

    /// Create a category.
    pub async fn create_category(
        &self,
        token: &str,
        form: &CategoryForm,
    ) -> Result<Category, ClientError> {
        let response = self
            .http
            .post(self.url(endpoints::CATEGORIES))
            .bearer_auth(token)
            .json(form)
            .send()
            .await?;

        decode(response).await
    }

    /// Delete a category and return the server's confirmation message.
    pub async fn delete_category(
        &self,
        token: &str,
        category_id: CategoryId,
    ) -> Result<String, ClientError> {
        let response = self
            .http
            .delete(self.url(&format_endpoint(endpoints::CATEGORY, category_id)))
            .bearer_auth(token)
            .send()
            .await?;

        decode::<MessageBody>(response)
            .await
            .map(|body| body.message)
    }

    /// The transactions of the user that `token` belongs to, newest first.
    pub async fn transactions(&self, token: &str) -> Result<Vec<TransactionListItem>, ClientError> {
        let response = self
            .http
            .get(self.url(endpoints::TRANSACTIONS))
            .bearer_auth(token)
            .send()
            .await?;

        decode(response).await
    }

    /// Create a transaction, uploading its receipt image if it has one.
    pub async fn create_transaction(
        &self,
        token: &str,
        request: NewTransactionRequest,
    ) -> Result<Transaction, ClientError> {
        let mut form = Form::new()
            .text("amount", request.amount.to_string())
            .text("description", request.description)
            .text("categoryId", request.category_id.to_string());

        if let Some(date) = request.date {
            form = form.text("date", date);
        }

        if let Some(image) = request.image {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.content_type)?;
            form = form.part(IMAGE_FIELD, part);
        }

        let response = self
            .http
            .post(self.url(endpoints::TRANSACTIONS))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        decode(response).await
    }

    /// A single transaction with its full category.
    pub async fn transaction(
        &self,
        token: &str,
        transaction_id: TransactionId,
    ) -> Result<TransactionDetail, ClientError> {
        let response = self
            .http
            .get(self.url(&format_endpoint(endpoints::TRANSACTION, transaction_id)))
            .bearer_auth(token)
            .send()
            .await?;

        decode(response).await
    }

    /// Delete a transaction and return the server's confirmation message.
    pub async fn delete_transaction(
        &self,
        token: &str,
        transaction_id: TransactionId,
    ) -> Result<String, ClientError> {
        let response = self
            .http
            .delete(self.url(&format_endpoint(endpoints::TRANSACTION, transaction_id)))
            .bearer_auth(token)
            .send()
            .await?;

        decode::<MessageBody>(response)
            .await
            .map(|body| body.message)
    }
}

/// Decode a successful response as `T`, or turn an error response into a [ClientError].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&body).map_err(|error| ClientError::Decode(error.to_string()));
    }

    let ErrorBody { message, errors } = serde_json::from_slice(&body).unwrap_or_default();
    let message = message.unwrap_or_else(|| status.to_string());

    Err(match status {
        StatusCode::BAD_REQUEST => match errors {
            Some(errors) => ClientError::Validation(errors),
            None => ClientError::Rejected(message),
        },
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        status => ClientError::Server { status, message },
    })
}
