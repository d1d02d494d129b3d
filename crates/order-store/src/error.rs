use domain::{DomainError, OrderStatus, PaymentStatus};
use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order header does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A row keyed by this order already exists.
    #[error("{entity} already exists for order {order_id}")]
    AlreadyExists {
        entity: &'static str,
        order_id: OrderId,
    },

    /// Order lines must have a positive quantity.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// All lines of one order share one currency.
    #[error("Currency mismatch for order {order_id}: expected {expected}, got {actual}")]
    CurrencyMismatch {
        order_id: OrderId,
        expected: String,
        actual: String,
    },

    /// The order header cannot move from its current status to the requested one.
    #[error("Invalid order transition for {order_id}: {from} -> {to}")]
    InvalidOrderTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The payment record has already been settled.
    #[error("Invalid payment transition for {order_id}: {from} -> {to}")]
    InvalidPaymentTransition {
        order_id: OrderId,
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// A successful payment must carry the collaborator's transaction id.
    #[error("Successful payment for order {0} has no transaction id")]
    MissingTransactionId(OrderId),

    /// Shipments are only recorded for orders whose payment succeeded.
    #[error("Payment for order {0} has not succeeded")]
    PaymentNotSettled(OrderId),

    /// A configured table name is not a plain SQL identifier.
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    /// A value could not be encoded for, or decoded from, storage.
    #[error("Invalid value: {0}")]
    Domain(#[from] DomainError),

    /// A stored column could not be read back.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The write did not finish before the request deadline.
    #[error("Deadline exceeded")]
    Timeout,

    /// The store refused the operation for a non-database reason.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
