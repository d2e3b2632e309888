//! External collaborators of the billing saga: traits, HTTP clients and
//! in-memory implementations.

pub mod inventory;
pub mod printing;

pub use inventory::{
    HttpInventoryService, InMemoryInventoryService, InventoryClientConfig, InventoryService,
    Reservation, ReservationError, ReservationStatus,
};
pub use printing::{HttpPrintService, InMemoryPrintService, PrintError, PrintJob, PrintService};
