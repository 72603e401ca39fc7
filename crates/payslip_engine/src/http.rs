use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ApiError, FailureKind};

pub(crate) fn with_json<T: Serialize + ?Sized>(
    builder: RequestBuilder,
    body: &T,
) -> Result<RequestBuilder, ApiError> {
    let bytes = serde_json::to_vec(body)
        .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
    Ok(builder
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(bytes))
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

pub(crate) async fn expect_success(response: Response) -> Result<(), ApiError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(response).await)
    }
}

pub(crate) async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    let message = backend_message(&body);
    if status == StatusCode::UNAUTHORIZED {
        return ApiError::new(
            FailureKind::Unauthorized,
            message.unwrap_or_else(|| status.to_string()),
        );
    }
    match message {
        Some(message) => ApiError::new(
            FailureKind::Backend {
                status: status.as_u16(),
            },
            message,
        ),
        None => ApiError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string()),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Extracts `{"error": ...}` or `{"detail": ...}` from a JSON body.
pub(crate) fn backend_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed
        .error
        .or(parsed.detail)
        .filter(|message| !message.trim().is_empty())
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::backend_message;

    #[test]
    fn error_and_detail_bodies_are_recognised() {
        assert_eq!(
            backend_message(br#"{"error": "Aucun bulletin"}"#).as_deref(),
            Some("Aucun bulletin")
        );
        assert_eq!(
            backend_message(br#"{"detail": "Not found."}"#).as_deref(),
            Some("Not found.")
        );
    }

    #[test]
    fn other_bodies_have_no_message() {
        assert_eq!(backend_message(b"<html>oops</html>"), None);
        assert_eq!(backend_message(br#"{"error": "  "}"#), None);
        assert_eq!(backend_message(br#"["a"]"#), None);
    }
}
