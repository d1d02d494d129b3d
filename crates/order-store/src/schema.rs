//! Physical table names and DDL for the order schema.
//!
//! Deployments may rename the tables; the shape of the schema is fixed.

use crate::{Result, StoreError};

const MAX_IDENTIFIER_LEN: usize = 63;

/// Physical names of the four order tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub orders: String,
    pub order_items: String,
    pub order_payments: String,
    pub order_shipments: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            orders: "orders".to_string(),
            order_items: "order_items".to_string(),
            order_payments: "order_payments".to_string(),
            order_shipments: "order_shipments".to_string(),
        }
    }
}

impl TableNames {
    /// Checks every name is a plain, unquoted SQL identifier.
    ///
    /// Names are interpolated into statements, so nothing else is accepted.
    pub fn validate(&self) -> Result<()> {
        for name in self.all() {
            if !is_plain_identifier(name) {
                return Err(StoreError::InvalidTableName(name.to_string()));
            }
        }
        Ok(())
    }

    fn all(&self) -> [&str; 4] {
        [
            &self.orders,
            &self.order_items,
            &self.order_payments,
            &self.order_shipments,
        ]
    }

    /// Renders the `CREATE TABLE IF NOT EXISTS` statements, parents first.
    pub fn create_statements(&self) -> Vec<String> {
        vec![
            format!(
                r#"CREATE TABLE IF NOT EXISTS {orders} (
    id UUID PRIMARY KEY,
    status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#,
                orders = self.orders
            ),
            format!(
                r#"CREATE TABLE IF NOT EXISTS {items} (
    id BIGSERIAL PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES {orders}(id) ON DELETE CASCADE,
    product_id TEXT NOT NULL,
    product_name TEXT NOT NULL,
    currency_code CHAR(3) NOT NULL,
    unit_units BIGINT NOT NULL,
    unit_nanos INT NOT NULL CHECK (unit_nanos > -1000000000 AND unit_nanos < 1000000000),
    quantity INT NOT NULL CHECK (quantity > 0),
    subtotal NUMERIC(40, 9) GENERATED ALWAYS AS
        ((unit_units::NUMERIC + unit_nanos::NUMERIC / 1000000000) * quantity) STORED
)"#,
                items = self.order_items,
                orders = self.orders
            ),
            format!(
                r#"CREATE TABLE IF NOT EXISTS {payments} (
    order_id UUID PRIMARY KEY REFERENCES {orders}(id) ON DELETE CASCADE,
    transaction_id TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#,
                payments = self.order_payments,
                orders = self.orders
            ),
            format!(
                r#"CREATE TABLE IF NOT EXISTS {shipments} (
    order_id UUID PRIMARY KEY REFERENCES {orders}(id) ON DELETE CASCADE,
    tracking_id TEXT NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'PROCESSING',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#,
                shipments = self.order_shipments,
                orders = self.orders
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{items}_order_id ON {items} (order_id)",
                items = self.order_items
            ),
        ]
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
