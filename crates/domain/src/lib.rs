//! Domain layer for the checkout service.
//!
//! This crate provides the value types shared by the order store and the
//! checkout orchestrator:
//! - Currency-tagged `Money` with exact fixed-point arithmetic
//! - Status state machines for orders, payments and shipments
//! - Cart, product, address and payment-instrument value objects

pub mod error;
pub mod order;

pub use error::DomainError;
pub use order::{
    Address, CartItem, CreditCardInfo, Money, NANOS_PER_UNIT, OrderItem, OrderStatus,
    PaymentStatus, Product, ProductId, ShipmentStatus, is_valid_currency_code,
};
