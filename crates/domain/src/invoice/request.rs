//! Inbound invoice requests and their validation.

use serde::{Deserialize, Serialize};

use super::{InvoiceError, ProductId};

/// Raw request to create an invoice, as received from a caller.
///
/// Quantities are signed so malformed input (zero or negative) reaches
/// validation instead of failing deserialization with an opaque message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub customer_name: String,
    pub items: Vec<LineRequest>,
}

/// A requested line: product and quantity, no price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A validated invoice request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    customer_name: String,
    lines: Vec<RequestedLine>,
}

/// A validated line: non-empty product id and positive quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestedLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CreateInvoice {
    pub fn new(customer_name: impl Into<String>, items: Vec<LineRequest>) -> Self {
        Self {
            customer_name: customer_name.into(),
            items,
        }
    }

    /// Validates the request without touching any collaborator.
    ///
    /// The customer name and product ids are trimmed; quantities must fit
    /// in `u32` and be greater than zero.
    pub fn validate(self) -> Result<InvoiceRequest, InvoiceError> {
        let customer_name = self.customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err(InvoiceError::EmptyCustomerName);
        }
        if self.items.is_empty() {
            return Err(InvoiceError::NoItems);
        }

        let lines = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let product_id = item.product_id.trim();
                if product_id.is_empty() {
                    return Err(InvoiceError::EmptyProductId { index });
                }
                let quantity = u32::try_from(item.quantity)
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or(InvoiceError::InvalidQuantity {
                        index,
                        quantity: item.quantity,
                    })?;
                Ok(RequestedLine {
                    product_id: ProductId::new(product_id),
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InvoiceRequest {
            customer_name,
            lines,
        })
    }
}

impl InvoiceRequest {
    /// Returns the trimmed customer name.
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Returns the validated lines in request order.
    pub fn lines(&self) -> &[RequestedLine] {
        &self.lines
    }

    /// Returns each distinct product id once, in first-seen order.
    pub fn distinct_products(&self) -> Vec<&ProductId> {
        let mut seen = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !seen.contains(&&line.product_id) {
                seen.push(&line.product_id);
            }
        }
        seen
    }
}
