//! Order-placement saga for the checkout service.
//!
//! `CheckoutOrchestrator::place_order` turns a user's cart into a paid,
//! shipped order:
//! 1. Record the order and its payment as PENDING
//! 2. Read the cart and price every line in the user's currency
//! 3. Quote and convert shipping, record the order lines
//! 4. Charge the card and record the result
//! 5. Ship and record the shipment
//!
//! The steps are not one transaction. A failed charge marks the order
//! FAILED; a failure after the charge is surfaced without a refund.

pub mod error;
pub mod orchestrator;
pub mod phase;
pub mod request;
pub mod services;

pub use error::{CheckoutError, Result, ServiceError};
pub use orchestrator::{CheckoutConfig, CheckoutOrchestrator, Collaborators};
pub use phase::Phase;
pub use request::{OrderResult, PlaceOrderRequest};
pub use services::{
    CardType, CartService, ChargeRecord, CurrencyService, EmailService, InMemoryCartService,
    InMemoryCurrencyService, InMemoryEmailService, InMemoryPaymentService, InMemoryProductCatalog,
    InMemoryShippingService, PaymentService, ProductCatalogService, ShippingService,
};
