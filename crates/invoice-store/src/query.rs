use domain::{DateRange, InvoiceSummary};

use crate::{InvoiceStoreError, Result};

/// Largest page a listing may return.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Default page size when the caller does not pass one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A validated page window: `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validates `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(InvoiceStoreError::InvalidPage(
                "page must be at least 1".to_string(),
            ));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(InvoiceStoreError::InvalidPage(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Listing query: a UTC day window plus a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceQuery {
    pub range: DateRange,
    pub page: PageRequest,
}

impl InvoiceQuery {
    pub fn new(range: DateRange, page: PageRequest) -> Self {
        Self { range, page }
    }
}

/// One page of invoices plus the size of the full matching set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePage {
    pub items: Vec<InvoiceSummary>,
    /// Count of all invoices in the window, independent of paging.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
