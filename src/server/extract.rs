//! Form-field extraction that accepts both url-encoded and multipart bodies.

use crate::Error;
use axum::async_trait;
use axum::extract::multipart::MultipartError;
use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;

/// Deserializes named text fields from either
/// `application/x-www-form-urlencoded` or `multipart/form-data`.
///
/// Multipart file fields are ignored.
#[derive(Debug, Clone)]
pub struct FormFields<T>(pub T);

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn field_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(err.body_text())
    } else {
        Error::BadRequest(format!("Failed to read multipart field: {}", err))
    }
}

async fn multipart_pairs(mut multipart: Multipart) -> Result<Vec<(String, String)>, Error> {
    let mut pairs = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(field_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            continue;
        }

        let value = field.text().await.map_err(field_error)?;
        pairs.push((name, value));
    }

    Ok(pairs)
}

#[async_trait]
impl<S, T> FromRequest<S> for FormFields<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;

            let pairs = multipart_pairs(multipart).await?;
            let encoded = serde_urlencoded::to_string(&pairs)
                .map_err(|e| Error::InvalidForm(e.to_string()))?;
            let value = serde_urlencoded::from_str(&encoded)
                .map_err(|e| Error::InvalidForm(e.to_string()))?;

            return Ok(FormFields(value));
        }

        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| match e.status() {
                StatusCode::UNPROCESSABLE_ENTITY => Error::InvalidForm(e.body_text()),
                StatusCode::PAYLOAD_TOO_LARGE => Error::PayloadTooLarge(e.body_text()),
                _ => Error::BadRequest(e.body_text()),
            })?;

        Ok(FormFields(value))
    }
}
