//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body has the shape
//! `{"success": false, "code": "...", "message": "..."}`.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout did not record an order.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request body or path failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

const RETRY_AFTER_SECS: u32 = 1;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::Unavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_) | AuthError::MissingField(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::AmountOverflow => {
                    StatusCode::BAD_REQUEST
                }
                CheckoutError::ProductNotFound(_) => StatusCode::CONFLICT,
                CheckoutError::LedgerWriteFailed(_) | CheckoutError::StorageUnavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Database(err) => match err {
                RepositoryError::Conflict(_) => "conflict",
                RepositoryError::Unavailable(_) => "storage_unavailable",
                RepositoryError::Database(_) => "internal_error",
            },
            Self::Auth(err) => err.code(),
            Self::Checkout(err) => err.code(),
            Self::NotFound(_) => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Seconds a client should wait before retrying, for failures that a
    /// plain retry may fix.
    #[must_use]
    pub const fn retry_after(&self) -> Option<u32> {
        match self {
            Self::Checkout(err) if err.is_retryable() => Some(RETRY_AFTER_SECS),
            Self::Database(err) | Self::Auth(AuthError::Repository(err))
                if err.is_transient() =>
            {
                Some(RETRY_AFTER_SECS)
            }
            _ => None,
        }
    }

    fn public_message(&self) -> String {
        // Don't expose internal error details to clients
        match self {
            Self::Database(RepositoryError::Conflict(_)) => {
                "The request conflicts with the current state".to_string()
            }
            Self::Database(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::MissingField(_) | AuthError::UserNotFound => err.to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::LedgerWriteFailed(_) => {
                    "The order could not be recorded, please retry".to_string()
                }
                CheckoutError::StorageUnavailable(_) => {
                    "Storage is temporarily unavailable, please retry".to_string()
                }
                _ => err.to_string(),
            },
            Self::NotFound(what) => format!("{what} not found"),
            Self::InvalidRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            success: false,
            code: self.code(),
            message: self.public_message(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this once a request is attributed to a user so errors carry it.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String(value.clone()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eglys_core::ProductId;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 7".to_string());
        assert_eq!(err.to_string(), "Not found: product 7");

        let err = AppError::InvalidRequest("userId is required".to_string());
        assert_eq!(err.to_string(), "Invalid request: userId is required");
    }

    #[test]
    fn test_checkout_status_codes() {
        assert_eq!(
            AppError::from(CheckoutError::EmptyCart).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CheckoutError::AmountOverflow).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CheckoutError::ProductNotFound(ProductId::new(99))).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(CheckoutError::LedgerWriteFailed(RepositoryError::Unavailable(
                "pool timed out".to_string()
            )))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_error_classification() {
        let conflict = AppError::Database(RepositoryError::Conflict("duplicate".to_string()));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(conflict.code(), "conflict");

        let unavailable = AppError::Database(RepositoryError::Unavailable("io".to_string()));
        assert_eq!(unavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unavailable.code(), "storage_unavailable");
        assert_eq!(unavailable.public_message(), "Internal server error");
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::UserAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(AuthError::MissingField("email")).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_of(AppError::from(CheckoutError::EmptyCart)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "empty_cart");
        assert_eq!(body["message"], "cart is empty");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let err = AppError::from(CheckoutError::StorageUnavailable(
            RepositoryError::Unavailable("pool timed out at 10.0.0.3".to_string()),
        ));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "storage_unavailable");
        assert!(!body["message"].as_str().unwrap().contains("10.0.0.3"));
    }

    #[test]
    fn test_retry_after_only_for_retryable_failures() {
        let response = AppError::from(CheckoutError::LedgerWriteFailed(
            RepositoryError::Unavailable("pool timed out".to_string()),
        ))
        .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");

        let transient = AppError::from(RepositoryError::Unavailable("io".to_string()));
        assert_eq!(transient.retry_after(), Some(1));

        assert_eq!(AppError::from(CheckoutError::EmptyCart).retry_after(), None);
        assert_eq!(
            AppError::from(RepositoryError::Conflict("dup".to_string())).retry_after(),
            None
        );
        let response = AppError::from(CheckoutError::EmptyCart).into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
