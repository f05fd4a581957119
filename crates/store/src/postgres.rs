use std::time::Duration;

use async_trait::async_trait;
use common::{CustomerId, InvoiceId, OrderId, SaleId, SkuId};
use domain::{
    DeliveryDetails, InvoiceNumber, InvoiceStatus, LineItem, Money, OrderStatus, PaymentMethod,
    Period, SaleStatus,
};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CheckoutRecord, InvoiceRecord, OrderRecord, RecordCounts, Result, SaleRecord, SkuRecord,
    StockChange, StoreError, VoidStamp,
    store::{DEFAULT_LOCK_TIMEOUT, Store, StoreTx},
};

/// Columns of one checkout, joined through the fulfillment order.
const CHECKOUT_SELECT: &str = r#"
    SELECT
        s.id AS sale_id, s.customer_id, s.payment_method, s.total_cents AS sale_total_cents,
        s.status AS sale_status, s.created_at AS sale_created_at, s.voided_at AS sale_voided_at,
        i.id AS invoice_id, i.number, i.total_cents AS invoice_total_cents,
        i.status AS invoice_status, i.created_at AS invoice_created_at,
        i.voided_at AS invoice_voided_at, i.void_reason, i.voided_by,
        o.id AS order_id, o.total_cents AS order_total_cents, o.status AS order_status,
        o.dedup_key, o.delivery, o.created_at AS order_created_at, o.voided_at AS order_voided_at
    FROM fulfillment_orders o
    JOIN sales s ON s.id = o.sale_id
    JOIN invoices i ON i.id = o.invoice_id
"#;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store with the default lock timeout.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long a transaction waits for a row lock before failing.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        tracing::debug!("running checkout migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Registers a customer in the directory.
    pub async fn insert_customer(&self, id: CustomerId, name: &str) -> Result<()> {
        sqlx::query("INSERT INTO customers (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(id.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Creates or replaces a catalog SKU.
    pub async fn upsert_sku(&self, sku: &SkuRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO skus (id, name, available, unit_price_cents, active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                available = EXCLUDED.available,
                unit_price_cents = EXCLUDED.unit_price_cents,
                active = EXCLUDED.active
            "#,
        )
        .bind(sku.id.as_str())
        .bind(&sku.name)
        .bind(sku.available)
        .bind(sku.unit_price.cents())
        .bind(sku.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the committed available quantity of a SKU.
    pub async fn available(&self, id: &SkuId) -> Result<Option<i64>> {
        let available: Option<i64> = sqlx::query_scalar("SELECT available FROM skus WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(available)
    }

    /// Moves a fulfillment order to another status outside of checkout.
    pub async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        sqlx::query("UPDATE fulfillment_orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Counts committed checkout rows per table.
    pub async fn record_counts(&self) -> Result<RecordCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sales) AS sales,
                (SELECT COUNT(*) FROM sale_line_items) AS sale_lines,
                (SELECT COUNT(*) FROM invoices) AS invoices,
                (SELECT COUNT(*) FROM invoice_line_items) AS invoice_lines,
                (SELECT COUNT(*) FROM fulfillment_orders) AS orders
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(RecordCounts {
            sales: row.try_get("sales")?,
            sale_lines: row.try_get("sale_lines")?,
            invoices: row.try_get("invoices")?,
            invoice_lines: row.try_get("invoice_lines")?,
            orders: row.try_get("orders")?,
        })
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx> {
        let mut tx = self.pool.begin().await?;

        // SET LOCAL cannot take bind parameters; set_config(.., true) is the
        // transaction-scoped equivalent.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await?;

        Ok(PostgresTx { tx })
    }
}

/// An open PostgreSQL transaction.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

impl PostgresTx {
    fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    fn row_to_checkout(row: &PgRow) -> Result<CheckoutRecord> {
        let customer_id = row
            .try_get::<Option<Uuid>, _>("customer_id")?
            .map(CustomerId::from_uuid);
        let payment_method = row.try_get::<String, _>("payment_method")?.parse::<PaymentMethod>()?;
        let sale_id = SaleId::from_uuid(row.try_get("sale_id")?);
        let invoice_id = InvoiceId::from_uuid(row.try_get("invoice_id")?);

        let delivery = row
            .try_get::<Option<serde_json::Value>, _>("delivery")?
            .map(serde_json::from_value::<DeliveryDetails>)
            .transpose()?;

        Ok(CheckoutRecord {
            sale: SaleRecord {
                id: sale_id,
                customer_id,
                payment_method,
                total: Money::from_cents(row.try_get("sale_total_cents")?),
                status: row.try_get::<String, _>("sale_status")?.parse::<SaleStatus>()?,
                created_at: row.try_get("sale_created_at")?,
                voided_at: row.try_get("sale_voided_at")?,
            },
            invoice: InvoiceRecord {
                id: invoice_id,
                number: InvoiceNumber::parse(&row.try_get::<String, _>("number")?)?,
                sale_id,
                customer_id,
                payment_method,
                total: Money::from_cents(row.try_get("invoice_total_cents")?),
                status: row.try_get::<String, _>("invoice_status")?.parse::<InvoiceStatus>()?,
                created_at: row.try_get("invoice_created_at")?,
                voided_at: row.try_get("invoice_voided_at")?,
                void_reason: row.try_get("void_reason")?,
                voided_by: row.try_get("voided_by")?,
            },
            order: OrderRecord {
                id: OrderId::from_uuid(row.try_get("order_id")?),
                sale_id,
                invoice_id,
                customer_id,
                total: Money::from_cents(row.try_get("order_total_cents")?),
                status: row.try_get::<String, _>("order_status")?.parse::<OrderStatus>()?,
                dedup_key: row.try_get("dedup_key")?,
                delivery,
                created_at: row.try_get("order_created_at")?,
                voided_at: row.try_get("order_voided_at")?,
            },
            lines: Vec::new(),
        })
    }

    async fn load_lines(&mut self, sale_id: SaleId) -> Result<Vec<LineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT sku_id, quantity, unit_price_cents
            FROM sale_line_items
            WHERE sale_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(sale_id.as_uuid())
        .fetch_all(self.conn())
        .await?;

        rows.into_iter()
            .map(|row| {
                let quantity: i32 = row.try_get("quantity")?;
                let quantity = u32::try_from(quantity).map_err(|_| {
                    StoreError::InvalidData(format!("negative line quantity {quantity}"))
                })?;
                Ok(LineItem::new(
                    SkuId::new(row.try_get::<String, _>("sku_id")?),
                    quantity,
                    Money::from_cents(row.try_get("unit_price_cents")?),
                ))
            })
            .collect()
    }

    async fn fetch_checkout(&mut self, row: Option<PgRow>) -> Result<Option<CheckoutRecord>> {
        match row {
            Some(row) => {
                let mut record = Self::row_to_checkout(&row)?;
                record.lines = self.load_lines(record.sale.id).await?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn current_available(&mut self, id: &SkuId) -> Result<Option<i64>> {
        let available: Option<i64> = sqlx::query_scalar("SELECT available FROM skus WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(self.conn())
            .await?;
        Ok(available)
    }
}

/// Converts a line quantity for an `INTEGER` column.
fn line_quantity(line: &LineItem) -> Result<i32> {
    i32::try_from(line.quantity).map_err(|_| {
        StoreError::InvalidData(format!(
            "quantity {} for {} does not fit the quantity column",
            line.quantity, line.sku_id
        ))
    })
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    async fn customer_exists(&mut self, id: CustomerId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(self.conn())
                .await?;
        Ok(exists)
    }

    async fn find_sku(&mut self, id: &SkuId) -> Result<Option<SkuRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, name, available, unit_price_cents, active
            FROM skus
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(self.conn())
        .await?;

        match row {
            Some(row) => Ok(Some(SkuRecord {
                id: SkuId::new(row.try_get::<String, _>("id")?),
                name: row.try_get("name")?,
                available: row.try_get("available")?,
                unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
                active: row.try_get("active")?,
            })),
            None => Ok(None),
        }
    }

    async fn decrement_stock(&mut self, id: &SkuId, quantity: u32) -> Result<StockChange> {
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE skus
            SET available = available - $2
            WHERE id = $1 AND available >= $2
            RETURNING available
            "#,
        )
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(self.conn())
        .await?;

        if let Some(available) = remaining {
            return Ok(StockChange::Applied { available });
        }
        tracing::debug!(sku = %id, quantity, "conditional decrement matched no row");

        Ok(match self.current_available(id).await? {
            Some(available) => StockChange::Insufficient { available },
            None => StockChange::UnknownSku,
        })
    }

    async fn increment_stock(&mut self, id: &SkuId, quantity: u32) -> Result<StockChange> {
        let available: Option<i64> = sqlx::query_scalar(
            "UPDATE skus SET available = available + $2 WHERE id = $1 RETURNING available",
        )
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(self.conn())
        .await?;

        Ok(match available {
            Some(available) => StockChange::Applied { available },
            None => StockChange::UnknownSku,
        })
    }

    async fn advance_invoice_counter(&mut self, period: Period) -> Result<u32> {
        // Seed from invoices issued before the counter row existed.
        sqlx::query(
            r#"
            INSERT INTO invoice_sequences (period, last_value)
            SELECT $1, COALESCE(MAX(CAST(SUBSTRING(number FROM 8 FOR 4) AS INTEGER)), 0)
            FROM invoices
            WHERE number LIKE $2
            ON CONFLICT (period) DO NOTHING
            "#,
        )
        .bind(period.key())
        .bind(format!("{}%", period.prefix()))
        .execute(self.conn())
        .await?;

        let value: i32 = sqlx::query_scalar(
            r#"
            UPDATE invoice_sequences
            SET last_value = last_value + 1
            WHERE period = $1
            RETURNING last_value
            "#,
        )
        .bind(period.key())
        .fetch_one(self.conn())
        .await?;

        u32::try_from(value)
            .map_err(|_| StoreError::InvalidData(format!("negative invoice counter {value}")))
    }

    async fn lock_dedup_key(&mut self, dedup_key: &str) -> Result<()> {
        // Hash collisions only serialize unrelated keys.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(dedup_key)
            .execute(self.conn())
            .await?;
        Ok(())
    }

    async fn find_checkout_by_dedup_key(
        &mut self,
        dedup_key: &str,
    ) -> Result<Option<CheckoutRecord>> {
        let row = sqlx::query(&format!("{CHECKOUT_SELECT} WHERE o.dedup_key = $1"))
            .bind(dedup_key)
            .fetch_optional(self.conn())
            .await?;
        self.fetch_checkout(row).await
    }

    async fn find_checkout_by_invoice(&mut self, id: InvoiceId) -> Result<Option<CheckoutRecord>> {
        let row = sqlx::query(&format!("{CHECKOUT_SELECT} WHERE i.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(self.conn())
            .await?;
        self.fetch_checkout(row).await
    }

    async fn lock_checkout_by_invoice(&mut self, id: InvoiceId) -> Result<Option<CheckoutRecord>> {
        let row = sqlx::query(&format!("{CHECKOUT_SELECT} WHERE i.id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(self.conn())
            .await?;
        self.fetch_checkout(row).await
    }

    #[tracing::instrument(skip(self, record), fields(invoice = %record.invoice.number))]
    async fn insert_checkout(&mut self, record: &CheckoutRecord) -> Result<()> {
        let sale = &record.sale;
        let invoice = &record.invoice;
        let order = &record.order;

        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_id, payment_method, total_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(sale.id.as_uuid())
        .bind(sale.customer_id.map(|c| c.as_uuid()))
        .bind(sale.payment_method.as_str())
        .bind(sale.total.cents())
        .bind(sale.status.as_str())
        .bind(sale.created_at)
        .execute(self.conn())
        .await?;

        for (line_no, line) in (1_i32..).zip(&record.lines) {
            sqlx::query(
                r#"
                INSERT INTO sale_line_items
                    (sale_id, line_no, sku_id, quantity, unit_price_cents, subtotal_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(sale.id.as_uuid())
            .bind(line_no)
            .bind(line.sku_id.as_str())
            .bind(line_quantity(line)?)
            .bind(line.unit_price.cents())
            .bind(line.subtotal().cents())
            .execute(self.conn())
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO invoices
                (id, number, sale_id, customer_id, payment_method, total_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.number.to_string())
        .bind(invoice.sale_id.as_uuid())
        .bind(invoice.customer_id.map(|c| c.as_uuid()))
        .bind(invoice.payment_method.as_str())
        .bind(invoice.total.cents())
        .bind(invoice.status.as_str())
        .bind(invoice.created_at)
        .execute(self.conn())
        .await?;

        for (line_no, line) in (1_i32..).zip(&record.lines) {
            sqlx::query(
                r#"
                INSERT INTO invoice_line_items
                    (invoice_id, line_no, sku_id, quantity, unit_price_cents, subtotal_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(invoice.id.as_uuid())
            .bind(line_no)
            .bind(line.sku_id.as_str())
            .bind(line_quantity(line)?)
            .bind(line.unit_price.cents())
            .bind(line.subtotal().cents())
            .execute(self.conn())
            .await?;
        }

        let delivery = order
            .delivery
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO fulfillment_orders
                (id, sale_id, invoice_id, customer_id, total_cents, status, dedup_key, delivery, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.sale_id.as_uuid())
        .bind(order.invoice_id.as_uuid())
        .bind(order.customer_id.map(|c| c.as_uuid()))
        .bind(order.total.cents())
        .bind(order.status.as_str())
        .bind(&order.dedup_key)
        .bind(delivery)
        .bind(order.created_at)
        .execute(self.conn())
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, record, stamp), fields(invoice = %record.invoice.number))]
    async fn mark_checkout_voided(
        &mut self,
        record: &CheckoutRecord,
        stamp: &VoidStamp,
    ) -> Result<()> {
        let invoice = sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'voided', voided_at = $2, void_reason = $3, voided_by = $4
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(record.invoice.id.as_uuid())
        .bind(stamp.at)
        .bind(stamp.reason.as_deref())
        .bind(stamp.voided_by.as_deref())
        .execute(self.conn())
        .await?;
        if invoice.rows_affected() != 1 {
            return Err(StoreError::Conflict(format!(
                "invoice {} is not active",
                record.invoice.number
            )));
        }

        let sale = sqlx::query(
            r#"
            UPDATE sales
            SET status = 'voided', voided_at = $2
            WHERE id = $1 AND status = 'completed'
            "#,
        )
        .bind(record.sale.id.as_uuid())
        .bind(stamp.at)
        .execute(self.conn())
        .await?;
        if sale.rows_affected() != 1 {
            return Err(StoreError::Conflict(format!(
                "sale {} is not completed",
                record.sale.id
            )));
        }

        let order = sqlx::query(
            r#"
            UPDATE fulfillment_orders
            SET status = 'voided', voided_at = $2
            WHERE id = $1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(record.order.id.as_uuid())
        .bind(stamp.at)
        .execute(self.conn())
        .await?;
        if order.rows_affected() != 1 {
            return Err(StoreError::Conflict(format!(
                "order {} is not voidable",
                record.order.id
            )));
        }

        Ok(())
    }
}
