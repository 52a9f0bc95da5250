//! HTTP error responses.
//!
//! Failures detected before streaming starts become a status code plus a short
//! plain-text message. Internal details are logged, never sent.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::{ErrorKind, RelayError};

/// Error type returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests, please try again later.",
        )
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.message).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err.kind() {
            ErrorKind::InputRejected => tracing::info!("rejected request: {}", err),
            ErrorKind::PolicyViolation => tracing::info!("policy violation: {}", err),
            ErrorKind::UpstreamUnavailable => tracing::warn!("upstream failure: {}", err),
            ErrorKind::StreamInterrupted => tracing::warn!("stream interrupted: {}", err),
            ErrorKind::Internal => tracing::error!("internal error: {}", err),
        }
        ApiError::new(err.status(), err.public_message())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_model::Rejection;

    #[test]
    fn from_rejection() {
        let api: ApiError = RelayError::from(Rejection::MissingUrl).into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "Missing url parameter");
    }

    #[test]
    fn internal_detail_is_hidden() {
        let api: ApiError = RelayError::Internal("secret path /etc/x".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("/etc/x"));
    }

    #[test]
    fn response_is_plain_text() {
        let response = ApiError::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
