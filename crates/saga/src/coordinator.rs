//! Invoice orchestrator: the billing saga coordinator.

use std::time::Instant;

use domain::{CreateInvoice, Invoice, InvoiceDraft, ReservationId};
use invoice_store::InvoiceStore;
use tracing::field;
use uuid::Uuid;

use crate::error::{BillingError, Result};
use crate::invoice_billing;
use crate::saga::{BillingSaga, Compensation};
use crate::services::inventory::{InventoryService, ReservationError};
use crate::services::printing::PrintService;

/// Orchestrator behaviour switches.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Commit the reservation right after the invoice is stored.
    pub auto_commit: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { auto_commit: true }
    }
}

/// Creates invoices against an inventory reservation.
///
/// Steps run strictly in order, each external call is attempted once:
///
/// 1. validate the request
/// 2. snapshot prices and price every line
/// 3. reserve stock (registers a release compensation)
/// 4. persist header and lines in one transaction (discards the release)
/// 5. commit the reservation, best effort
/// 6. print the invoice, best effort
///
/// Only steps 1 to 4 can fail the call. A failure at step 4 runs the release
/// once; its outcome is logged and never changes the returned error.
pub struct InvoiceOrchestrator<S, I, P>
where
    S: InvoiceStore,
    I: InventoryService,
    P: PrintService,
{
    store: S,
    inventory: I,
    printer: Option<P>,
    config: OrchestratorConfig,
}

impl<S, I, P> InvoiceOrchestrator<S, I, P>
where
    S: InvoiceStore,
    I: InventoryService,
    P: PrintService,
{
    /// Creates a new orchestrator. Printing is skipped when `printer` is `None`.
    pub fn new(store: S, inventory: I, printer: Option<P>, config: OrchestratorConfig) -> Self {
        Self {
            store,
            inventory,
            printer,
            config,
        }
    }

    /// Runs the billing saga for one request.
    pub async fn create_invoice(&self, request: CreateInvoice) -> Result<Invoice> {
        let (_, result) = self.execute(request).await;
        result
    }

    /// Runs the billing saga and returns its record alongside the outcome.
    #[tracing::instrument(
        skip(self, request),
        fields(
            saga_type = invoice_billing::SAGA_TYPE,
            invoice_id = field::Empty,
            reservation_id = field::Empty,
        )
    )]
    pub async fn execute(&self, request: CreateInvoice) -> (BillingSaga, Result<Invoice>) {
        let saga_start = Instant::now();
        let mut saga = BillingSaga::new();
        if let Err(e) = saga.start() {
            return (saga, Err(e));
        }

        let result = self.run(&mut saga, request).await;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("billing_saga_duration_seconds").record(duration);
        match &result {
            Ok(invoice) => {
                metrics::counter!("billing_invoices_created_total").increment(1);
                tracing::info!(invoice_id = %invoice.id, total = %invoice.total, duration, "invoice created");
            }
            Err(err) => {
                metrics::counter!("billing_saga_failed_total", "kind" => err.kind()).increment(1);
                tracing::warn!(
                    kind = err.kind(),
                    step = saga.failed_step().unwrap_or("unknown"),
                    error = %err,
                    duration,
                    "invoice saga failed"
                );
            }
        }
        (saga, result)
    }

    async fn run(&self, saga: &mut BillingSaga, request: CreateInvoice) -> Result<Invoice> {
        // 1. Validate
        let request = match request.validate() {
            Ok(request) => request,
            Err(e) => return Err(self.abort(saga, invoice_billing::STEP_VALIDATE, e.into()).await),
        };
        saga.complete_step(invoice_billing::STEP_VALIDATE);

        // 2. Resolve prices. An unknown product stops here, before any reservation.
        let draft = match self.inventory.product_prices().await {
            Ok(prices) => InvoiceDraft::price(&request, &prices).map_err(BillingError::from),
            Err(e) => Err(BillingError::ReservationUnavailable(e.to_string())),
        };
        let draft = match draft {
            Ok(draft) => draft,
            Err(e) => return Err(self.abort(saga, invoice_billing::STEP_RESOLVE_PRICES, e).await),
        };
        saga.complete_step(invoice_billing::STEP_RESOLVE_PRICES);

        // 3. Reserve
        let request_id = new_request_id();
        let reservation = match self.inventory.reserve(&request_id, request.lines()).await {
            Ok(reservation) => reservation,
            Err(e) => {
                let error = match e {
                    ReservationError::Conflict(detail) => BillingError::ReservationConflict(detail),
                    ReservationError::Unavailable(detail) => {
                        BillingError::ReservationUnavailable(detail)
                    }
                };
                return Err(self.abort(saga, invoice_billing::STEP_RESERVE_INVENTORY, error).await);
            }
        };
        let reservation_id = reservation.reservation_id;
        tracing::Span::current().record("reservation_id", reservation_id.as_str());
        saga.complete_step(invoice_billing::STEP_RESERVE_INVENTORY);
        saga.register_compensation(
            invoice_billing::STEP_RESERVE_INVENTORY,
            Compensation::ReleaseReservation(reservation_id.clone()),
        );

        // 4. Persist
        let mut invoice = draft.issue(reservation_id.clone());
        tracing::Span::current().record("invoice_id", field::display(invoice.id));
        if let Err(e) = self.store.insert_invoice(&invoice).await {
            let error = BillingError::PersistenceFailure(e.to_string());
            return Err(self.abort(saga, invoice_billing::STEP_PERSIST_INVOICE, error).await);
        }
        saga.discard_compensations(invoice_billing::STEP_RESERVE_INVENTORY);
        saga.complete_step(invoice_billing::STEP_PERSIST_INVOICE);

        // 5. Commit. A failure leaves the reservation in `reserved` while the
        // invoice row exists; inventory has to reconcile it, we do not release.
        if self.config.auto_commit && self.commit(&reservation_id).await {
            saga.complete_step(invoice_billing::STEP_COMMIT_RESERVATION);
        }

        // 6. Print
        if let Some(printer) = &self.printer
            && self.print(printer, &mut invoice).await
        {
            saga.complete_step(invoice_billing::STEP_PRINT_INVOICE);
        }

        Ok(finish(saga, invoice))
    }

    /// Runs registered compensations in reverse and returns `error` unchanged.
    async fn abort(
        &self,
        saga: &mut BillingSaga,
        step: &'static str,
        error: BillingError,
    ) -> BillingError {
        let compensations = match saga.begin_compensation(step, error.to_string()) {
            Ok(compensations) => compensations,
            Err(e) => {
                tracing::error!(error = %e, step, "saga could not enter compensation");
                return error;
            }
        };

        for compensation in compensations {
            metrics::counter!("billing_compensations_total").increment(1);
            match &compensation {
                Compensation::ReleaseReservation(reservation_id) => {
                    match self.inventory.release(reservation_id).await {
                        Ok(()) => tracing::info!(%reservation_id, "reservation released"),
                        Err(e) => {
                            metrics::counter!(
                                "billing_best_effort_failures_total",
                                "step" => compensation.name()
                            )
                            .increment(1);
                            tracing::error!(%reservation_id, error = %e, "reservation release failed");
                        }
                    }
                }
            }
        }

        if let Err(e) = saga.fail() {
            tracing::error!(error = %e, "saga could not be marked failed");
        }
        error
    }

    async fn commit(&self, reservation_id: &ReservationId) -> bool {
        match self.inventory.commit(reservation_id).await {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!(
                    "billing_best_effort_failures_total",
                    "step" => invoice_billing::STEP_COMMIT_RESERVATION
                )
                .increment(1);
                tracing::warn!(%reservation_id, error = %e, "reservation commit failed");
                false
            }
        }
    }

    async fn print(&self, printer: &P, invoice: &mut Invoice) -> bool {
        let job = match printer.print_invoice(invoice).await {
            Ok(job) => job,
            Err(e) => {
                metrics::counter!(
                    "billing_best_effort_failures_total",
                    "step" => invoice_billing::STEP_PRINT_INVOICE
                )
                .increment(1);
                tracing::warn!(invoice_id = %invoice.id, error = %e, "invoice print failed");
                return false;
            }
        };

        if let Err(e) = self
            .store
            .attach_document(invoice.id, &job.pdf_url, &job.job_id)
            .await
        {
            metrics::counter!(
                "billing_best_effort_failures_total",
                "step" => invoice_billing::STEP_ATTACH_DOCUMENT
            )
            .increment(1);
            tracing::warn!(invoice_id = %invoice.id, error = %e, "document attachment failed");
        }

        invoice.pdf_url = Some(job.pdf_url);
        invoice.print_job_id = Some(job.job_id);
        true
    }
}

/// Marks the saga completed. The invoice exists from the persist step on, so
/// a bookkeeping failure here is logged and the invoice still returned.
fn finish(saga: &mut BillingSaga, invoice: Invoice) -> Invoice {
    if let Err(e) = saga.complete() {
        tracing::error!(invoice_id = %invoice.id, error = %e, "saga could not be marked completed");
    }
    invoice
}

/// Fresh idempotency token for a reserve call.
fn new_request_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("req-{}", &hex[..8])
}
