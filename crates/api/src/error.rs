//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use order_store::StoreError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),

    /// The checkout saga failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// A direct store read failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Checkout(err) => checkout_status(err),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

fn checkout_status(err: &CheckoutError) -> (StatusCode, &'static str) {
    match err {
        CheckoutError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        CheckoutError::UnsupportedCurrency { .. } => {
            (StatusCode::BAD_REQUEST, "unsupported_currency")
        }
        CheckoutError::EmptyCart => (StatusCode::BAD_REQUEST, "empty_cart"),
        CheckoutError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        CheckoutError::PaymentDeclined { .. } => (StatusCode::PAYMENT_REQUIRED, "payment_declined"),
        CheckoutError::DownstreamUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "downstream_unavailable")
        }
        CheckoutError::PersistenceFailure { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure")
        }
        CheckoutError::Pricing { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "pricing_failure"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string(), "code": code });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use checkout::Phase;
    use order_store::OrderId;

    use super::*;

    #[test]
    fn test_checkout_errors_map_to_client_statuses() {
        let cases = [
            (CheckoutError::EmptyCart, StatusCode::BAD_REQUEST),
            (
                CheckoutError::InvalidRequest("user_id must not be empty".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CheckoutError::UnsupportedCurrency {
                    phase: Phase::ConvertPrice,
                    currency: "XYZ".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                CheckoutError::NotFound {
                    phase: Phase::GetProduct,
                    reason: "P1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                CheckoutError::PaymentDeclined {
                    reason: "card expired".into(),
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_and_code().0, expected);
        }
    }

    #[test]
    fn test_failures_map_to_server_statuses() {
        let unavailable = ApiError::from(CheckoutError::DownstreamUnavailable {
            phase: Phase::ShipOrder,
            reason: "timeout".into(),
        });
        assert_eq!(
            unavailable.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "downstream_unavailable")
        );

        let persistence = ApiError::from(CheckoutError::PersistenceFailure {
            phase: Phase::CreatePendingOrder,
            source: StoreError::Timeout,
        });
        assert_eq!(
            persistence.status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let store = ApiError::from(StoreError::OrderNotFound(OrderId::new()));
        assert_eq!(store.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
