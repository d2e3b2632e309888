//! Priced invoices.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::InvoiceId;
use serde::{Deserialize, Serialize};

use super::{InvoiceError, InvoiceRequest, Money, ProductId, ReservationId};

/// Unit prices keyed by product, as read from the inventory service at
/// request time.
pub type PriceList = HashMap<ProductId, Money>;

/// A priced invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// The product identifier.
    pub product_id: ProductId,

    /// Quantity billed.
    pub quantity: u32,

    /// Unit price snapshotted when the invoice was requested.
    pub unit_price: Money,

    /// `unit_price * quantity`.
    pub subtotal: Money,
}

impl InvoiceLine {
    /// Creates a line, computing its subtotal.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
            subtotal: unit_price.multiply(quantity),
        }
    }
}

/// An invoice priced against a snapshot but not yet backed by a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    customer_name: String,
    lines: Vec<InvoiceLine>,
    total: Money,
}

impl InvoiceDraft {
    /// Prices every requested line against `prices`.
    ///
    /// Each distinct product is looked up once, in first-seen order, and its
    /// unit price rounded to cents so every subtotal and the total keep the
    /// two-place scale they are stored with. Fails with `ProductNotFound` on
    /// the first product missing from the snapshot. Nothing supplied by the
    /// caller is trusted for amounts.
    pub fn price(request: &InvoiceRequest, prices: &PriceList) -> Result<Self, InvoiceError> {
        let mut unit_prices = HashMap::with_capacity(request.lines().len());
        for product_id in request.distinct_products() {
            let price = *prices
                .get(product_id)
                .ok_or_else(|| InvoiceError::ProductNotFound(product_id.clone()))?;
            if price.is_negative() {
                return Err(InvoiceError::InvalidPrice {
                    product_id: product_id.clone(),
                    price,
                });
            }
            unit_prices.insert(product_id, price.rounded());
        }

        let lines: Vec<InvoiceLine> = request
            .lines()
            .iter()
            .map(|requested| {
                InvoiceLine::new(
                    requested.product_id.clone(),
                    requested.quantity,
                    unit_prices[&requested.product_id],
                )
            })
            .collect();

        let total: Money = lines.iter().map(|l| l.subtotal).sum();
        Ok(Self {
            customer_name: request.customer_name().to_string(),
            lines,
            total,
        })
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// Turns the draft into an invoice bound to a reservation.
    pub fn issue(self, reservation_id: ReservationId) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            customer_name: self.customer_name,
            created_at: Utc::now(),
            reservation_id,
            total: self.total,
            lines: self.lines,
            pdf_url: None,
            print_job_id: None,
        }
    }
}

/// A persisted invoice.
///
/// `total` always equals the sum of the line subtotals. Only `pdf_url` and
/// `print_job_id` may change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub reservation_id: ReservationId,
    pub total: Money,
    pub lines: Vec<InvoiceLine>,
    pub pdf_url: Option<String>,
    pub print_job_id: Option<String>,
}

impl Invoice {
    /// Returns true if `total` matches the sum of line subtotals.
    pub fn is_balanced(&self) -> bool {
        let sum: Money = self.lines.iter().map(|l| l.subtotal).sum();
        sum == self.total
    }

    /// Returns the listing view of this invoice.
    pub fn summary(&self) -> InvoiceSummary {
        InvoiceSummary {
            id: self.id,
            customer_name: self.customer_name.clone(),
            total: self.total,
            created_at: self.created_at,
        }
    }
}

/// Invoice header as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub id: InvoiceId,
    pub customer_name: String,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{CreateInvoice, LineRequest};
    use rust_decimal::Decimal;

    fn prices() -> PriceList {
        PriceList::from([
            (ProductId::new("SKU-001"), Money::from_cents(1000)),
            (ProductId::new("SKU-002"), Money::from_cents(2550)),
        ])
    }

    fn request(items: Vec<LineRequest>) -> InvoiceRequest {
        CreateInvoice::new("Ada", items).validate().unwrap()
    }

    #[test]
    fn test_line_subtotal() {
        let line = InvoiceLine::new("SKU-001", 3, Money::from_cents(1000));
        assert_eq!(line.subtotal, Money::from_cents(3000));
    }

    #[test]
    fn test_draft_total_is_sum_of_subtotals() {
        let req = request(vec![
            LineRequest::new("SKU-001", 2),
            LineRequest::new("SKU-002", 1),
            LineRequest::new("SKU-001", 1),
        ]);
        let draft = InvoiceDraft::price(&req, &prices()).unwrap();

        assert_eq!(draft.lines().len(), 3);
        assert_eq!(draft.total(), Money::from_cents(2000 + 2550 + 1000));
    }

    #[test]
    fn test_sub_cent_prices_are_rounded_per_unit() {
        let mut prices = prices();
        prices.insert(ProductId::new("SKU-HALF"), Money::new(Decimal::new(5, 3)));
        prices.insert(ProductId::new("SKU-ODD"), Money::new(Decimal::new(33333, 4)));
        let req = request(vec![
            LineRequest::new("SKU-HALF", 1),
            LineRequest::new("SKU-HALF", 1),
            LineRequest::new("SKU-ODD", 3),
        ]);

        let invoice = InvoiceDraft::price(&req, &prices)
            .unwrap()
            .issue(ReservationId::new("res-1"));

        assert_eq!(invoice.lines[0].unit_price, Money::from_cents(1));
        assert_eq!(invoice.lines[0].subtotal, Money::from_cents(1));
        assert_eq!(invoice.lines[2].unit_price, Money::from_cents(333));
        assert_eq!(invoice.lines[2].subtotal, Money::from_cents(999));
        assert_eq!(invoice.total, Money::from_cents(1001));
        assert!(invoice.is_balanced());
        for amount in invoice
            .lines
            .iter()
            .flat_map(|l| [l.unit_price, l.subtotal])
            .chain([invoice.total])
        {
            assert!(amount.amount().scale() <= 2, "{amount}");
        }
    }

    #[test]
    fn test_draft_unknown_product() {
        let req = request(vec![
            LineRequest::new("SKU-001", 1),
            LineRequest::new("SKU-404", 1),
        ]);
        let err = InvoiceDraft::price(&req, &prices()).unwrap_err();
        assert_eq!(err, InvoiceError::ProductNotFound(ProductId::new("SKU-404")));
    }

    #[test]
    fn test_draft_rejects_negative_price() {
        let mut prices = prices();
        prices.insert(ProductId::new("SKU-001"), Money::from_cents(-1));
        let req = request(vec![LineRequest::new("SKU-001", 1)]);
        assert!(matches!(
            InvoiceDraft::price(&req, &prices),
            Err(InvoiceError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_issue_binds_reservation() {
        let req = request(vec![LineRequest::new("SKU-002", 2)]);
        let invoice = InvoiceDraft::price(&req, &prices())
            .unwrap()
            .issue(ReservationId::new("res-abc123"));

        assert_eq!(invoice.reservation_id.as_str(), "res-abc123");
        assert_eq!(invoice.customer_name, "Ada");
        assert_eq!(invoice.total, Money::from_cents(5100));
        assert!(invoice.is_balanced());
        assert!(invoice.pdf_url.is_none());
        assert!(invoice.print_job_id.is_none());
    }

    #[test]
    fn test_summary_mirrors_header() {
        let req = request(vec![LineRequest::new("SKU-001", 1)]);
        let invoice = InvoiceDraft::price(&req, &prices())
            .unwrap()
            .issue(ReservationId::new("res-1"));
        let summary = invoice.summary();
        assert_eq!(summary.id, invoice.id);
        assert_eq!(summary.total, invoice.total);
        assert_eq!(summary.created_at, invoice.created_at);
    }
}
