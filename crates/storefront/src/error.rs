//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Responses are JSON:
//!
//! ```json
//! {"status": "error", "message": "...", "errors": {"email": "..."}}
//! ```
//!
//! `errors` (and `step`) are only present for checkout validation failures.
//! Server-side faults are captured to Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::checkout::{CheckoutStep, FieldErrors, OrderError, StepRejected};
use crate::payment::TokenizationError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart command failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout step transition refused.
    #[error("Checkout error: {0}")]
    Checkout(#[from] StepRejected),

    /// Order placement failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Backend API call failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<CheckoutStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

fn api_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
        ApiError::Status { status, .. } if *status >= 400 && *status < 500 => {
            match StatusCode::from_u16(*status) {
                Ok(code) => code,
                Err(_) => StatusCode::BAD_REQUEST,
            }
        }
        ApiError::Status { .. } | ApiError::Http(_) | ApiError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Cart(err) => match err {
                CartError::PromoInvalid => StatusCode::UNPROCESSABLE_ENTITY,
                CartError::LineNotFound(_) => StatusCode::NOT_FOUND,
                CartError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                CartError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                StepRejected::InvalidFields { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                StepRejected::AtFinalStep | StepRejected::ForwardJump { .. } => {
                    StatusCode::CONFLICT
                }
            },
            Self::Order(err) => match err {
                OrderError::AlreadySubmitting | OrderError::EmptyCart => StatusCode::CONFLICT,
                OrderError::PaymentTokenization(TokenizationError::Declined(_)) => {
                    StatusCode::PAYMENT_REQUIRED
                }
                OrderError::PaymentTokenization(_) => StatusCode::BAD_GATEWAY,
                OrderError::Submission(ApiError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
                OrderError::Submission(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Api(err) => api_status(err),
            Self::Session(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the shopper. Internal details are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cart(CartError::StorageUnavailable(_)) | Self::Session(_) => {
                "Your cart could not be saved. Please try again.".to_string()
            }
            Self::Cart(CartError::Encode(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Cart(err) => err.to_string(),
            Self::Checkout(StepRejected::InvalidFields { .. }) => {
                "Please fix the highlighted fields".to_string()
            }
            Self::Checkout(err) => err.to_string(),
            Self::Order(OrderError::PaymentTokenization(err)) => err.user_message(),
            Self::Order(OrderError::Submission(err)) | Self::Api(err) => err.user_message(),
            Self::Order(err) => err.to_string(),
            Self::NotFound(msg) | Self::Conflict(msg) | Self::BadRequest(msg) => msg.clone(),
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
        } else {
            tracing::debug!(error = %self, status = %status, "Request refused");
        }

        let (step, errors) = match &self {
            Self::Checkout(StepRejected::InvalidFields { step, errors }) => {
                (Some(*step), Some(errors))
            }
            _ => (None, None),
        };

        let body = ErrorBody {
            status: "error",
            message: self.user_message(),
            step,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for shopper actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::StorageError;
    use crate::checkout::Field;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::from(CartError::PromoInvalid).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(CartError::StorageUnavailable(StorageError::Unavailable(
                "full".to_string()
            )))
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(OrderError::PaymentTokenization(TokenizationError::Declined(
                "declined".to_string()
            )))
            .status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::from(OrderError::Submission(ApiError::Timeout)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::from(OrderError::Submission(ApiError::Status {
                status: 500,
                message: "boom".to_string()
            }))
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(OrderError::AlreadySubmitting).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(ApiError::Status {
                status: 409,
                message: "Email already registered".to_string()
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(ApiError::NotFound("Product not found".to_string())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_validation_error_body_lists_fields() {
        let mut errors = FieldErrors::default();
        errors.add(Field::Email, "This field is required");
        let err = AppError::from(StepRejected::InvalidFields {
            step: CheckoutStep::Contact,
            errors,
        });

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "error");
        assert_eq!(body["step"], "contact");
        assert_eq!(body["errors"]["email"], "This field is required");
    }

    #[tokio::test]
    async fn test_internal_details_not_exposed() {
        let (status, body) = body_json(AppError::Internal("db password wrong".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_promo_invalid_message() {
        let (status, body) = body_json(AppError::from(CartError::PromoInvalid)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Invalid promo code");
    }
}
