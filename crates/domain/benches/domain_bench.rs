use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CreateInvoice, DailySales, DateRange, InvoiceDraft, LineRequest, Money, PriceList, ProductId,
    ReservationId, SalesReport,
};

fn price_list(products: usize) -> PriceList {
    (0..products)
        .map(|i| {
            (
                ProductId::new(format!("SKU-{i:04}")),
                Money::from_cents(100 + i as i64),
            )
        })
        .collect()
}

fn request(lines: usize) -> CreateInvoice {
    CreateInvoice::new(
        "Bench Customer",
        (0..lines)
            .map(|i| LineRequest::new(format!("SKU-{:04}", i % 50), (i % 7 + 1) as i64))
            .collect(),
    )
}

fn bench_validate_request(c: &mut Criterion) {
    let req = request(50);

    c.bench_function("domain/validate_request_50_lines", |b| {
        b.iter(|| req.clone().validate().unwrap());
    });
}

fn bench_price_draft(c: &mut Criterion) {
    let prices = price_list(500);
    let req = request(50).validate().unwrap();

    c.bench_function("domain/price_draft_50_lines", |b| {
        b.iter(|| {
            InvoiceDraft::price(&req, &prices)
                .unwrap()
                .issue(ReservationId::new("res-bench"))
        });
    });
}

fn bench_sales_report(c: &mut Criterion) {
    let range = DateRange::parse("2024-01-01", "2024-12-31").unwrap();
    let days: Vec<DailySales> = (0..366u64)
        .map(|i| DailySales {
            date: range.from() + chrono::Days::new(i),
            total: Money::from_cents(10_000 + i as i64),
            count: i % 9 + 1,
        })
        .collect();

    c.bench_function("domain/sales_report_366_days", |b| {
        b.iter(|| SalesReport::from_days(range, days.clone()));
    });
}

criterion_group!(
    benches,
    bench_validate_request,
    bench_price_draft,
    bench_sales_report
);
criterion_main!(benches);
