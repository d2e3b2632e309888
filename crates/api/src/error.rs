//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ReportError;
use invoice_store::InvoiceStoreError;
use saga::BillingError;

use crate::identity::IdentityError;

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as `{"error": <kind>, "detail": <message>}`.
#[derive(Debug)]
pub enum ApiError {
    /// Billing saga failure.
    Billing(BillingError),
    /// Malformed or out-of-range query parameters.
    Validation(String),
    /// Request body could not be decoded.
    InvalidBody(JsonRejection),
    /// Resource not found.
    NotFound(String),
    /// Caller could not be authorized.
    Identity(IdentityError),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Billing(err) => {
                let status = match err {
                    BillingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    BillingError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                    BillingError::ReservationConflict(_) => StatusCode::CONFLICT,
                    BillingError::ReservationUnavailable(_) => StatusCode::BAD_GATEWAY,
                    BillingError::PersistenceFailure(_)
                    | BillingError::InvalidTransition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.kind(), err.to_string())
            }
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            ApiError::InvalidBody(rejection) => {
                (rejection.status(), "invalid_body", rejection.body_text())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Identity(err) => {
                let (status, kind) = match err {
                    IdentityError::MissingCredentials | IdentityError::InvalidCredentials => {
                        (StatusCode::UNAUTHORIZED, "unauthorized")
                    }
                    IdentityError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
                    IdentityError::Unavailable(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "identity_unavailable")
                    }
                };
                (status, kind, err.to_string())
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, detail) = self.parts();
        if status.is_server_error() {
            tracing::error!(%status, kind, error = %detail, "request failed");
        }

        let body = serde_json::json!({ "error": kind, "detail": detail });
        (status, axum::Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        ApiError::Billing(err)
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<InvoiceStoreError> for ApiError {
    fn from(err: InvoiceStoreError) -> Self {
        match err {
            InvoiceStoreError::InvalidPage(msg) => ApiError::Validation(msg),
            InvoiceStoreError::NotFound(id) => ApiError::NotFound(format!("Invoice {id} not found")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        ApiError::Identity(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection)
    }
}
