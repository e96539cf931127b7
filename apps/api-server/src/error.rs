//! Error translation for HTTP handlers.
//!
//! Every failure leaves the server as a status code plus a plain-text body.
//! Store failures are logged in full and reported to the client generically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::CoreError;
use tracing::{error, warn};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing field; message names the first offending field.
    Validation(String),
    /// Username already taken.
    Conflict,
    /// Unknown user id.
    NotFound,
    /// No route matched.
    RouteNotFound,
    /// Underlying store failure.
    Store(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Conflict => CoreError::AlreadyExists.to_string(),
            ApiError::NotFound => CoreError::NotFound.to_string(),
            ApiError::RouteNotFound => "not found".to_string(),
            ApiError::Store(_) => "Internal Server Error".to_string(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Invalid(msg) => ApiError::Validation(msg),
            CoreError::AlreadyExists => ApiError::Conflict,
            CoreError::NotFound => ApiError::NotFound,
            CoreError::Repository(msg) => ApiError::Store(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Store(detail) => error!(err = %detail, "store error"),
            other => warn!(status = status.as_u16(), err = ?other, "request failed"),
        }
        // A String body is sent as text/plain; charset=utf-8.
        (status, self.message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::header;

    async fn render(err: ApiError) -> (StatusCode, String, String) {
        let resp = err.into_response();
        let status = resp.status();
        let ctype = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, ctype, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn maps_domain_errors() {
        let (status, ctype, body) =
            render(CoreError::Invalid("Path `duration` is required.".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(ctype.starts_with("text/plain"));
        assert_eq!(body, "Path `duration` is required.");

        let (status, _, body) = render(CoreError::AlreadyExists.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Username already taken");

        let (status, _, body) = render(CoreError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "user not found");
    }

    #[tokio::test]
    async fn store_errors_are_redacted() {
        let (status, _, body) =
            render(CoreError::Repository("sqlite error: disk I/O".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
    }

    #[tokio::test]
    async fn route_not_found() {
        let (status, _, body) = render(ApiError::RouteNotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "not found");
    }
}
