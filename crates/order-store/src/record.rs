//! Rows read back from the order store.

use chrono::{DateTime, Utc};
use domain::{Money, OrderStatus, PaymentStatus, ProductId, ShipmentStatus};
use serde::Serialize;

use crate::OrderId;

/// The order header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line row. `subtotal` is computed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemRecord {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

/// The payment row, one per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRecord {
    pub order_id: OrderId,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// The shipment row, one per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentRecord {
    pub order_id: OrderId,
    pub tracking_id: String,
    pub status: ShipmentStatus,
    pub created_at: DateTime<Utc>,
}

/// Every row belonging to one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderAggregate {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
    pub payment: Option<PaymentRecord>,
    pub shipment: Option<ShipmentRecord>,
}
