//! Reading and storing receipt images sent with multipart requests.

use std::path::Path;

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::http::StatusCode;
use time::OffsetDateTime;

use crate::{BlobStore, Error, FieldErrors};

/// The multipart field that carries a receipt image.
pub const IMAGE_FIELD: &str = "image";

/// The largest accepted image, in bytes (5 MiB).
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// The accepted image file extensions, in lower case.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

const ALLOWED_IMAGE_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

const MAX_NAME_ATTEMPTS: usize = 5;

/// An image read from a request that passed the type and size checks.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    /// The file extension in lower case, e.g. "png".
    pub extension: String,
    /// The file contents.
    pub bytes: Vec<u8>,
}

fn image_error(message: &str) -> Error {
    Error::Validation(FieldErrors::single(IMAGE_FIELD, message))
}

fn too_large_error() -> Error {
    image_error(&format!(
        "Image must be at most {} MB",
        MAX_IMAGE_SIZE / (1024 * 1024)
    ))
}

/// Map a failure to read the multipart body to a validation error.
pub fn multipart_error(error: MultipartError) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large_error();
    }

    Error::Validation(FieldErrors::single("body", error.body_text()))
}

/// Map a request that is not a multipart form to a validation error.
pub fn multipart_rejection(rejection: MultipartRejection) -> Error {
    Error::Validation(FieldErrors::single("body", rejection.body_text()))
}

/// Check the file name and declared MIME type of an upload and return its
/// lower case extension.
///
/// # Errors
///
/// Returns an [Error::Validation] for the image field unless both the
/// extension and the MIME type name a JPEG or PNG image.
pub fn check_image_type(file_name: &str, content_type: Option<&str>) -> Result<String, Error> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase)
        .filter(|extension| ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()));

    let mime_type_ok = content_type
        .map(|content_type| content_type.to_lowercase())
        .is_some_and(|content_type| ALLOWED_IMAGE_MIME_TYPES.contains(&content_type.as_str()));

    match extension {
        Some(extension) if mime_type_ok => Ok(extension),
        _ => Err(image_error("Images only! Accepted types are jpg, jpeg and png")),
    }
}

/// Read the image in `field`, checking its type before reading and its size
/// while streaming.
///
/// Returns `None` when the field holds no file, which is what browsers send
/// for an empty file input.
///
/// # Errors
///
/// Returns an [Error::Validation] if the file is not a JPEG or PNG image, is
/// larger than [MAX_IMAGE_SIZE], or the body could not be read.
pub async fn read_image(mut field: Field<'_>) -> Result<Option<UploadedImage>, Error> {
    let file_name = field.file_name().unwrap_or_default().to_owned();

    if file_name.is_empty() {
        return Ok(None);
    }

    let extension = check_image_type(&file_name, field.content_type())?;
    let mut bytes = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > MAX_IMAGE_SIZE {
            tracing::debug!("Rejected upload \"{file_name}\" for exceeding {MAX_IMAGE_SIZE} bytes");
            return Err(too_large_error());
        }

        bytes.extend_from_slice(&chunk);
    }

    Ok(Some(UploadedImage { extension, bytes }))
}

/// The name to store an image under: the field name, the current time in
/// nanoseconds and the extension, e.g. `image-1729238400123456789.png`.
pub fn image_name(extension: &str) -> String {
    format!(
        "{IMAGE_FIELD}-{}.{extension}",
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    )
}

/// Store `image` in `store` under a fresh name and return its reference.
///
/// # Errors
///
/// Returns an [Error::BlobStorage] if the image could not be written or no
/// unused name was found.
pub fn store_image(store: &dyn BlobStore, image: &UploadedImage) -> Result<String, Error> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let name = image_name(&image.extension);

        match store.put(&name, &image.bytes) {
            Err(Error::BlobExists(name)) => {
                tracing::debug!("Image name {name} is taken, trying another");
            }
            result => return result,
        }
    }

    Err(Error::BlobStorage(
        "could not find an unused name for the image".to_owned(),
    ))
}

#[cfg(test)]
mod check_image_type_tests {
    use crate::Error;

    use super::check_image_type;

    #[test]
    fn accepts_jpeg_and_png() {
        assert_eq!(
            check_image_type("receipt.jpg", Some("image/jpeg")),
            Ok("jpg".to_owned())
        );
        assert_eq!(
            check_image_type("receipt.JPEG", Some("image/jpg")),
            Ok("jpeg".to_owned())
        );
        assert_eq!(
            check_image_type("receipt.png", Some("image/png")),
            Ok("png".to_owned())
        );
    }

    #[test]
    fn rejects_text_file() {
        let result = check_image_type("notes.txt", Some("text/plain"));

        assert!(matches!(result, Err(Error::Validation(errors)) if errors.get("image").is_some()));
    }

    #[test]
    fn rejects_mismatched_mime_type() {
        assert!(check_image_type("receipt.png", Some("text/plain")).is_err());
        assert!(check_image_type("receipt.png", None).is_err());
    }

    #[test]
    fn rejects_mismatched_extension() {
        assert!(check_image_type("receipt.gif", Some("image/png")).is_err());
        assert!(check_image_type("receipt", Some("image/png")).is_err());
    }
}
