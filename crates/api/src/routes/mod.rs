pub mod health;
pub mod invoices;
pub mod metrics;
pub mod params;
pub mod reports;
