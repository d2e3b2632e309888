//! Billing error types.

use domain::{InvoiceError, ProductId};
use thiserror::Error;

use crate::state::SagaState;

/// Failures surfaced by `InvoiceOrchestrator::create_invoice`.
///
/// Best-effort steps (commit, print, document attachment and the release
/// that follows a failed write) never produce one of these.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The request was rejected before any external call.
    #[error("Validation failed: {0}")]
    Validation(InvoiceError),

    /// A requested product is not in the inventory price list.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Inventory refused the reservation, typically for lack of stock.
    #[error("Reservation conflict: {0}")]
    ReservationConflict(String),

    /// Inventory could not be reached or answered unexpectedly.
    #[error("Inventory unavailable: {0}")]
    ReservationUnavailable(String),

    /// The invoice could not be written. The reservation has been released
    /// (or a release was attempted).
    #[error("Invoice persistence failed: {0}")]
    PersistenceFailure(String),

    /// The saga record was driven through an illegal transition.
    #[error("Invalid saga transition from {from} to {to}")]
    InvalidTransition { from: SagaState, to: SagaState },
}

impl BillingError {
    /// Stable label for logs, metrics and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            BillingError::Validation(_) => "validation_error",
            BillingError::ProductNotFound(_) => "product_not_found",
            BillingError::ReservationConflict(_) => "reservation_conflict",
            BillingError::ReservationUnavailable(_) => "reservation_unavailable",
            BillingError::PersistenceFailure(_) => "persistence_failure",
            BillingError::InvalidTransition { .. } => "internal_error",
        }
    }
}

impl From<InvoiceError> for BillingError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::ProductNotFound(product_id) => BillingError::ProductNotFound(product_id),
            // A negative price is bad data from inventory, not bad caller input
            err @ InvoiceError::InvalidPrice { .. } => {
                BillingError::ReservationUnavailable(err.to_string())
            }
            other => BillingError::Validation(other),
        }
    }
}

/// Convenience type alias for billing results.
pub type Result<T> = std::result::Result<T, BillingError>;
