//! Invoice billing saga constants.

/// The saga type identifier for invoice billing.
pub const SAGA_TYPE: &str = "InvoiceBilling";

/// Step name: Validate the request shape.
pub const STEP_VALIDATE: &str = "validate";

/// Step name: Snapshot unit prices from inventory.
pub const STEP_RESOLVE_PRICES: &str = "resolve_prices";

/// Step name: Reserve stock for every line.
pub const STEP_RESERVE_INVENTORY: &str = "reserve_inventory";

/// Step name: Write the invoice header and lines.
pub const STEP_PERSIST_INVOICE: &str = "persist_invoice";

/// Step name: Commit the reservation (best effort).
pub const STEP_COMMIT_RESERVATION: &str = "commit_reservation";

/// Step name: Request the invoice document (best effort).
pub const STEP_PRINT_INVOICE: &str = "print_invoice";

/// Step name: Store the printed document reference (best effort).
pub const STEP_ATTACH_DOCUMENT: &str = "attach_document";

/// Compensation name: Release a reservation after a failed write.
pub const COMPENSATE_RELEASE_RESERVATION: &str = "release_reservation";
