use async_trait::async_trait;
use chrono::NaiveDate;
use common::InvoiceId;
use domain::{DailySales, DateRange, Invoice, InvoiceLine, InvoiceSummary, Money, ReservationId};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{InvoicePage, InvoiceQuery, InvoiceStoreError, Result, store::InvoiceStore};

/// PostgreSQL-backed invoice store implementation.
#[derive(Clone)]
pub struct PostgresInvoiceStore {
    pool: PgPool,
}

impl PostgresInvoiceStore {
    /// Creates a new PostgreSQL invoice store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_line(row: PgRow) -> Result<InvoiceLine> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| InvoiceStoreError::Corrupt(format!("quantity out of range: {quantity}")))?;

        Ok(InvoiceLine {
            product_id: row.try_get::<String, _>("product_id")?.into(),
            quantity,
            unit_price: Money::new(row.try_get("unit_price")?),
            subtotal: Money::new(row.try_get("subtotal")?),
        })
    }

    fn row_to_invoice(row: &PgRow, lines: Vec<InvoiceLine>) -> Result<Invoice> {
        Ok(Invoice {
            id: InvoiceId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_name: row.try_get("customer_name")?,
            created_at: row.try_get("created_at")?,
            reservation_id: ReservationId::new(row.try_get::<String, _>("reservation_id")?),
            total: Money::new(row.try_get("total")?),
            lines,
            pdf_url: row.try_get("pdf_url")?,
            print_job_id: row.try_get("print_job_id")?,
        })
    }

    fn row_to_daily_sales(row: PgRow) -> Result<DailySales> {
        let count: i64 = row.try_get("count")?;
        Ok(DailySales {
            date: row.try_get::<NaiveDate, _>("day")?,
            total: Money::new(row.try_get::<Decimal, _>("total")?),
            count: count.max(0) as u64,
        })
    }
}

#[async_trait]
impl InvoiceStore for PostgresInvoiceStore {
    #[tracing::instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<()> {
        if !invoice.is_balanced() {
            return Err(InvoiceStoreError::Unbalanced(invoice.id));
        }

        // Header and lines commit together or not at all
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (id, customer_name, created_at, reservation_id, total, pdf_url, print_job_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(&invoice.customer_name)
        .bind(invoice.created_at)
        .bind(invoice.reservation_id.as_str())
        .bind(invoice.total.amount())
        .bind(invoice.pdf_url.as_deref())
        .bind(invoice.print_job_id.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("invoices_pkey")
            {
                return InvoiceStoreError::Duplicate(invoice.id);
            }
            InvoiceStoreError::Database(e)
        })?;

        for (line_no, line) in invoice.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (invoice_id, line_no, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(invoice.id.as_uuid())
            .bind(line_no as i32 + 1)
            .bind(line.product_id.as_str())
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.amount())
            .bind(line.subtotal.amount())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        let header = sqlx::query(
            r#"
            SELECT id, customer_name, created_at, reservation_id, total, pdf_url, print_job_id
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity, unit_price, subtotal
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(Self::row_to_line)
            .collect::<Result<Vec<_>>>()?;

        Self::row_to_invoice(&header, lines).map(Some)
    }

    async fn list_invoices(&self, query: InvoiceQuery) -> Result<InvoicePage> {
        let start = query.range.start();
        let end = query.range.end_exclusive();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, customer_name, total, created_at
            FROM invoices
            WHERE created_at >= $1 AND created_at < $2
            ORDER BY created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(i64::from(query.page.page_size()))
        .bind(query.page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|row| {
                Ok(InvoiceSummary {
                    id: InvoiceId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    customer_name: row.try_get("customer_name")?,
                    total: Money::new(row.try_get("total")?),
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(InvoicePage {
            items,
            total: total.max(0) as u64,
            page: query.page.page(),
            page_size: query.page.page_size(),
        })
    }

    async fn daily_sales(&self, range: DateRange) -> Result<Vec<DailySales>> {
        let rows = sqlx::query(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
                   SUM(total) AS total,
                   COUNT(*) AS count
            FROM invoices
            WHERE created_at >= $1 AND created_at < $2
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(range.start())
        .bind(range.end_exclusive())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_daily_sales).collect()
    }

    async fn attach_document(&self, id: InvoiceId, pdf_url: &str, job_id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET pdf_url = $2, print_job_id = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(pdf_url)
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InvoiceStoreError::NotFound(id));
        }
        Ok(())
    }
}
