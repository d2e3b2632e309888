//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p invoice-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use common::InvoiceId;
use domain::{
    CreateInvoice, DateRange, Invoice, InvoiceDraft, InvoiceLine, LineRequest, Money, PriceList,
    ProductId, ReservationId,
};
use invoice_store::{InvoiceQuery, InvoiceStore, InvoiceStoreError, PageRequest, PostgresInvoiceStore};
use rust_decimal::Decimal;
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_invoices_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresInvoiceStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE invoice_items, invoices")
        .execute(&pool)
        .await
        .unwrap();

    PostgresInvoiceStore::new(pool)
}

fn invoice_at(day: u32, hour: u32, lines: Vec<InvoiceLine>) -> Invoice {
    let total = lines.iter().map(|l| l.subtotal).sum();
    Invoice {
        id: InvoiceId::new(),
        customer_name: "Ada Lovelace".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, day, hour, 30, 0).unwrap(),
        reservation_id: ReservationId::new("RES-0001"),
        total,
        lines,
        pdf_url: None,
        print_job_id: None,
    }
}

fn march(from: u32, to: u32) -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 3, from).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, to).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn test_insert_and_read_back() {
    let store = get_test_store().await;
    let invoice = invoice_at(
        1,
        10,
        vec![
            InvoiceLine::new("SKU-001", 2, Money::from_cents(1050)),
            InvoiceLine::new("SKU-002", 1, Money::from_cents(999)),
        ],
    );

    store.insert_invoice(&invoice).await.unwrap();

    let loaded = store.get_invoice(invoice.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, invoice.id);
    assert_eq!(loaded.total, Money::from_cents(3099));
    assert_eq!(loaded.lines.len(), 2);
    assert_eq!(loaded.lines[0].product_id.as_str(), "SKU-001");
    assert_eq!(loaded.lines[0].subtotal, Money::from_cents(2100));
    assert!(loaded.is_balanced());
}

#[tokio::test]
#[serial]
async fn test_sub_cent_prices_read_back_balanced() {
    let store = get_test_store().await;
    let prices = PriceList::from([(
        ProductId::new("SKU-HALF"),
        Money::new(Decimal::new(5, 3)),
    )]);
    let request = CreateInvoice::new(
        "Ada",
        vec![
            LineRequest::new("SKU-HALF", 1),
            LineRequest::new("SKU-HALF", 1),
        ],
    )
    .validate()
    .unwrap();
    let invoice = InvoiceDraft::price(&request, &prices)
        .unwrap()
        .issue(ReservationId::new("RES-0001"));

    store.insert_invoice(&invoice).await.unwrap();

    let loaded = store.get_invoice(invoice.id).await.unwrap().unwrap();
    assert_eq!(loaded.total, invoice.total);
    assert_eq!(loaded.total, Money::from_cents(2));
    assert_eq!(loaded.lines[0].subtotal, invoice.lines[0].subtotal);
    assert!(loaded.is_balanced());
}

#[tokio::test]
#[serial]
async fn test_get_missing_invoice() {
    let store = get_test_store().await;
    assert!(store.get_invoice(InvoiceId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_duplicate_insert_is_rejected() {
    let store = get_test_store().await;
    let invoice = invoice_at(1, 10, vec![InvoiceLine::new("SKU-001", 1, Money::from_cents(500))]);

    store.insert_invoice(&invoice).await.unwrap();
    let result = store.insert_invoice(&invoice).await;

    assert!(matches!(result, Err(InvoiceStoreError::Duplicate(id)) if id == invoice.id));
}

#[tokio::test]
#[serial]
async fn test_failed_line_insert_leaves_no_header() {
    let store = get_test_store().await;
    // The header row is written first; the negative unit price then trips
    // the line CHECK constraint.
    let mut invoice = invoice_at(1, 10, vec![InvoiceLine::new("SKU-001", 1, Money::from_cents(500))]);
    invoice.lines[0].unit_price = Money::from_cents(-500);
    invoice.lines[0].subtotal = Money::from_cents(500);

    let result = store.insert_invoice(&invoice).await;

    assert!(matches!(result, Err(InvoiceStoreError::Database(_))));
    assert!(store.get_invoice(invoice.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_list_is_windowed_ordered_and_paged() {
    let store = get_test_store().await;
    let line = || vec![InvoiceLine::new("SKU-001", 1, Money::from_cents(100))];
    let a = invoice_at(2, 8, line());
    let b = invoice_at(2, 9, line());
    let c = invoice_at(3, 23, line());
    let outside = invoice_at(4, 0, line());
    for invoice in [&c, &outside, &a, &b] {
        store.insert_invoice(invoice).await.unwrap();
    }

    let first = store
        .list_invoices(InvoiceQuery::new(march(1, 3), PageRequest::new(1, 2).unwrap()))
        .await
        .unwrap();
    assert_eq!(first.total, 3);
    let ids: Vec<_> = first.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);

    let second = store
        .list_invoices(InvoiceQuery::new(march(1, 3), PageRequest::new(2, 2).unwrap()))
        .await
        .unwrap();
    assert_eq!(second.total, 3);
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id, c.id);
}

#[tokio::test]
#[serial]
async fn test_daily_sales_aggregates_per_utc_day() {
    let store = get_test_store().await;
    store
        .insert_invoice(&invoice_at(1, 9, vec![InvoiceLine::new("SKU-001", 1, Money::from_cents(10000))]))
        .await
        .unwrap();
    store
        .insert_invoice(&invoice_at(1, 18, vec![InvoiceLine::new("SKU-001", 1, Money::from_cents(5000))]))
        .await
        .unwrap();
    store
        .insert_invoice(&invoice_at(3, 12, vec![InvoiceLine::new("SKU-002", 2, Money::from_cents(10000))]))
        .await
        .unwrap();

    let days = store.daily_sales(march(1, 3)).await.unwrap();

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(days[0].total, Money::from_cents(15000));
    assert_eq!(days[0].count, 2);
    assert_eq!(days[0].avg_ticket(), Money::from_cents(7500));
    assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
    assert_eq!(days[1].total, Money::from_cents(20000));
}

#[tokio::test]
#[serial]
async fn test_attach_document() {
    let store = get_test_store().await;
    let invoice = invoice_at(1, 10, vec![InvoiceLine::new("SKU-001", 1, Money::from_cents(500))]);
    store.insert_invoice(&invoice).await.unwrap();

    store
        .attach_document(invoice.id, "https://print.local/invoice.pdf", "JOB-0001")
        .await
        .unwrap();

    let loaded = store.get_invoice(invoice.id).await.unwrap().unwrap();
    assert_eq!(loaded.pdf_url.as_deref(), Some("https://print.local/invoice.pdf"));
    assert_eq!(loaded.print_job_id.as_deref(), Some("JOB-0001"));

    let missing = store.attach_document(InvoiceId::new(), "x", "y").await;
    assert!(matches!(missing, Err(InvoiceStoreError::NotFound(_))));
}
