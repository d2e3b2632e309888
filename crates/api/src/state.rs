//! Shared application state.

use std::sync::Arc;

use invoice_store::InvoiceStore;
use saga::{InventoryService, InvoiceOrchestrator, OrchestratorConfig, PrintService};

pub type DynInvoiceStore = Arc<dyn InvoiceStore>;
pub type DynInventoryService = Arc<dyn InventoryService>;
pub type DynPrintService = Arc<dyn PrintService>;

/// The orchestrator as wired by the server.
pub type Orchestrator = InvoiceOrchestrator<DynInvoiceStore, DynInventoryService, DynPrintService>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: DynInvoiceStore,
    pub report_currency: String,
}

impl AppState {
    pub fn new(
        store: DynInvoiceStore,
        inventory: DynInventoryService,
        printer: Option<DynPrintService>,
        config: OrchestratorConfig,
        report_currency: impl Into<String>,
    ) -> Self {
        let orchestrator = InvoiceOrchestrator::new(store.clone(), inventory, printer, config);
        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            report_currency: report_currency.into(),
        }
    }
}
