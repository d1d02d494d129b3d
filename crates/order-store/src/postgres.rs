use async_trait::async_trait;
use domain::{Money, OrderItem, OrderStatus, PaymentStatus, ProductId, ShipmentStatus};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, error::ErrorKind, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderId, OrderItemRecord, OrderRecord, PaymentRecord, Result, ShipmentRecord, StoreError,
    TableNames,
    store::{OrderStore, validate_items_for_insert, validate_payment_result},
};

/// PostgreSQL-backed order store implementation.
///
/// Every write is one statement, so each is atomic on its own; no
/// transaction spans two writes.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
    tables: TableNames,
}

impl PostgresOrderStore {
    /// Creates a store using the default table names.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tables: TableNames::default(),
        }
    }

    /// Creates a store using configured table names.
    pub fn with_table_names(pool: PgPool, tables: TableNames) -> Result<Self> {
        tables.validate()?;
        Ok(Self { pool, tables })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Gets the physical table names in use.
    pub fn table_names(&self) -> &TableNames {
        &self.tables
    }

    /// Runs the database migrations (default table names only).
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Creates the tables under the configured names if they do not exist.
    pub async fn create_schema(&self) -> Result<()> {
        for statement in self.tables.create_statements() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        tracing::info!(orders = %self.tables.orders, "order schema ready");
        Ok(())
    }

    async fn current_order_status(&self, order_id: OrderId) -> Result<Option<OrderStatus>> {
        let status: Option<String> =
            sqlx::query_scalar(&format!("SELECT status FROM {} WHERE id = $1", self.tables.orders))
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(status.map(|s| s.parse()).transpose()?)
    }

    async fn current_payment_status(&self, order_id: OrderId) -> Result<Option<PaymentStatus>> {
        let status: Option<String> = sqlx::query_scalar(&format!(
            "SELECT status FROM {} WHERE order_id = $1",
            self.tables.order_payments
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(status.map(|s| s.parse()).transpose()?)
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            status: row.try_get::<String, _>("status")?.parse()?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItemRecord> {
        let currency: String = row.try_get("currency_code")?;
        let product_id: String = row.try_get("product_id")?;
        let quantity: i32 = row.try_get("quantity")?;
        let subtotal_nanos: String = row.try_get("subtotal_nanos")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::InvalidQuantity {
            product_id: product_id.clone(),
            quantity: 0,
        })?;

        Ok(OrderItemRecord {
            id: row.try_get("id")?,
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::new(product_id),
            product_name: row.try_get("product_name")?,
            unit_price: Money::new(
                currency.as_str(),
                row.try_get("unit_units")?,
                row.try_get("unit_nanos")?,
            )?,
            quantity,
            subtotal: Money::from_nanos(currency.as_str(), parse_nanos(&subtotal_nanos)?)?,
        })
    }

    fn row_to_payment(row: PgRow) -> Result<PaymentRecord> {
        Ok(PaymentRecord {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            transaction_id: row.try_get("transaction_id")?,
            status: row.try_get::<String, _>("status")?.parse()?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_shipment(row: PgRow) -> Result<ShipmentRecord> {
        Ok(ShipmentRecord {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            tracking_id: row.try_get("tracking_id")?,
            status: row.try_get::<String, _>("status")?.parse()?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Maps constraint violations on insert to store errors.
fn map_insert_error(e: sqlx::Error, entity: &'static str, order_id: OrderId) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                return StoreError::AlreadyExists { entity, order_id };
            }
            ErrorKind::ForeignKeyViolation => return StoreError::OrderNotFound(order_id),
            _ => {}
        }
    }
    StoreError::Database(e)
}

/// Parses the integer text rendering of a NUMERIC count of billionths.
fn parse_nanos(text: &str) -> Result<i128> {
    text.trim()
        .parse::<i128>()
        .map_err(|e| StoreError::Decode(format!("subtotal {text:?}: {e}")))
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self))]
    async fn create_pending_order(&self, order_id: OrderId) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {} (id, status, created_at, updated_at) VALUES ($1, $2, NOW(), NOW())",
            self.tables.orders
        ))
        .bind(order_id.as_uuid())
        .bind(OrderStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "order", order_id))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn create_pending_payment(&self, order_id: OrderId) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {} (order_id, transaction_id, status, created_at) VALUES ($1, NULL, $2, NOW())",
            self.tables.order_payments
        ))
        .bind(order_id.as_uuid())
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "payment", order_id))?;

        Ok(())
    }

    #[tracing::instrument(skip(self, items), fields(count = items.len()))]
    async fn add_order_items(&self, order_id: OrderId, items: &[OrderItem]) -> Result<()> {
        validate_items_for_insert(order_id, items)?;
        if items.is_empty() {
            return Ok(());
        }

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let quantity = i32::try_from(item.quantity).map_err(|_| StoreError::InvalidQuantity {
                product_id: item.product_id.to_string(),
                quantity: item.quantity,
            })?;
            rows.push((item, quantity));
        }

        // subtotal is a generated column and is never part of the insert.
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} (order_id, product_id, product_name, currency_code, unit_units, unit_nanos, quantity) ",
            self.tables.order_items
        ));
        builder.push_values(rows, |mut b, (item, quantity)| {
            b.push_bind(order_id.as_uuid())
                .push_bind(item.product_id.as_str().to_string())
                .push_bind(item.product_name.clone())
                .push_bind(item.currency_code().to_string())
                .push_bind(item.unit_price.units())
                .push_bind(item.unit_price.nanos())
                .push_bind(quantity);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "order item", order_id))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_payment_result(
        &self,
        order_id: OrderId,
        transaction_id: Option<&str>,
        status: PaymentStatus,
    ) -> Result<()> {
        validate_payment_result(order_id, transaction_id, status)?;

        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET status = $1, transaction_id = COALESCE($2, transaction_id)
            WHERE order_id = $3 AND status = $4
            "#,
            self.tables.order_payments
        ))
        .bind(status.as_str())
        .bind(transaction_id)
        .bind(order_id.as_uuid())
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.current_payment_status(order_id).await? {
                None => Err(StoreError::OrderNotFound(order_id)),
                Some(from) => Err(StoreError::InvalidPaymentTransition {
                    order_id,
                    from,
                    to: status,
                }),
            };
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let allowed: Vec<String> = status
            .predecessors()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        // The predecessor check and the update are one statement.
        let result = sqlx::query(&format!(
            "UPDATE {} SET status = $1, updated_at = NOW() WHERE id = $2 AND status = ANY($3)",
            self.tables.orders
        ))
        .bind(status.as_str())
        .bind(order_id.as_uuid())
        .bind(&allowed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.current_order_status(order_id).await? {
                None => Err(StoreError::OrderNotFound(order_id)),
                Some(from) => Err(StoreError::InvalidOrderTransition {
                    order_id,
                    from,
                    to: status,
                }),
            };
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn create_shipment(
        &self,
        order_id: OrderId,
        tracking_id: &str,
        status: ShipmentStatus,
    ) -> Result<()> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {shipments} (order_id, tracking_id, status, created_at)
            SELECT $1, $2, $3, NOW()
            WHERE EXISTS (
                SELECT 1 FROM {payments} WHERE order_id = $1 AND status = $4
            )
            "#,
            shipments = self.tables.order_shipments,
            payments = self.tables.order_payments
        ))
        .bind(order_id.as_uuid())
        .bind(tracking_id)
        .bind(status.as_str())
        .bind(PaymentStatus::Success.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "shipment", order_id))?;

        if result.rows_affected() == 0 {
            return match self.current_order_status(order_id).await? {
                None => Err(StoreError::OrderNotFound(order_id)),
                Some(_) => Err(StoreError::PaymentNotSettled(order_id)),
            };
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.tables.orders))
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(&format!(
            "SELECT id, status, created_at, updated_at FROM {} WHERE id = $1",
            self.tables.orders
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, order_id, product_id, product_name, currency_code, unit_units, unit_nanos,
                   quantity, (subtotal * 1000000000)::NUMERIC(40, 0)::TEXT AS subtotal_nanos
            FROM {}
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
            self.tables.order_items
        ))
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn get_payment(&self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT order_id, transaction_id, status, created_at FROM {} WHERE order_id = $1",
            self.tables.order_payments
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn get_shipment(&self, order_id: OrderId) -> Result<Option<ShipmentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT order_id, tracking_id, status, created_at FROM {} WHERE order_id = $1",
            self.tables.order_shipments
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_shipment).transpose()
    }
}
