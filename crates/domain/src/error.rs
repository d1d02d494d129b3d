//! Domain error types.

use thiserror::Error;

/// Errors raised while constructing or combining domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Currency codes are three upper-case ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    /// Nanos out of range or with a sign different from units.
    #[error("Invalid money value: units={units}, nanos={nanos}")]
    InvalidNanos { units: i64, nanos: i32 },

    /// Arithmetic between amounts in different currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// The result does not fit into the money representation.
    #[error("Money amount overflow")]
    Overflow,

    /// Order lines must have a positive quantity.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// A persisted or transmitted status string is not recognised.
    #[error("Unknown {kind} status: {value:?}")]
    UnknownStatus { kind: &'static str, value: String },
}
