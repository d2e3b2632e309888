//! Billing saga: turns an invoice request into a persisted invoice backed by
//! an inventory reservation.
//!
//! The invoice billing saga follows these steps:
//! 1. Validate the request
//! 2. Resolve unit prices from inventory
//! 3. Reserve inventory
//! 4. Persist the invoice
//! 5. Commit the reservation (best effort)
//! 6. Print the invoice (best effort)
//!
//! If step 4 fails the reservation from step 3 is released.

pub mod coordinator;
pub mod error;
pub mod invoice_billing;
pub mod saga;
pub mod services;
pub mod state;

pub use coordinator::{InvoiceOrchestrator, OrchestratorConfig};
pub use error::BillingError;
pub use saga::{BillingSaga, Compensation};
pub use services::{
    HttpInventoryService, HttpPrintService, InMemoryInventoryService, InMemoryPrintService,
    InventoryClientConfig, InventoryService, PrintError, PrintJob, PrintService, Reservation,
    ReservationError, ReservationStatus,
};
pub use state::SagaState;
