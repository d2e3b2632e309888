use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::InvoiceId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{DateRange, Invoice, InvoiceLine, Money, ReservationId};
use invoice_store::{InMemoryInvoiceStore, InvoiceQuery, InvoiceStore, PageRequest};

fn make_invoice(minutes: i64) -> Invoice {
    let line = InvoiceLine::new("SKU-BENCH", 1, Money::from_cents(1000 + minutes % 500));
    Invoice {
        id: InvoiceId::new(),
        customer_name: "Benchmark Customer".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
        reservation_id: ReservationId::new("RES-BENCH"),
        total: line.subtotal,
        lines: vec![line],
        pdf_url: None,
        print_job_id: None,
    }
}

fn january() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
    .unwrap()
}

fn seeded_store(rt: &tokio::runtime::Runtime, count: i64) -> InMemoryInvoiceStore {
    let store = InMemoryInvoiceStore::new();
    rt.block_on(async {
        // One invoice every 30 minutes
        for i in 0..count {
            store.insert_invoice(&make_invoice(i * 30)).await.unwrap();
        }
    });
    store
}

fn bench_insert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryInvoiceStore::new();

    c.bench_function("invoice_store/insert", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.insert_invoice(&make_invoice(0)).await.unwrap();
            });
        });
    });
}

fn bench_list_page(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = seeded_store(&rt, 1000);
    let query = InvoiceQuery::new(january(), PageRequest::new(3, 50).unwrap());

    c.bench_function("invoice_store/list_page_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.list_invoices(query).await.unwrap();
            });
        });
    });
}

fn bench_daily_sales(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = seeded_store(&rt, 1000);

    c.bench_function("invoice_store/daily_sales_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.daily_sales(january()).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_insert, bench_list_page, bench_daily_sales);
criterion_main!(benches);
