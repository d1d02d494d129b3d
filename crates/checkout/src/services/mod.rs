//! Downstream service contracts and in-memory implementations.

pub mod cart;
pub mod catalog;
pub mod currency;
pub mod email;
pub mod payment;
pub mod shipping;
pub mod tracking;

pub use cart::{CartService, InMemoryCartService};
pub use catalog::{InMemoryProductCatalog, ProductCatalogService};
pub use currency::{CurrencyService, InMemoryCurrencyService};
pub use email::{EmailService, InMemoryEmailService};
pub use payment::{CardType, ChargeRecord, InMemoryPaymentService, PaymentService, validate_card};
pub use shipping::{InMemoryShippingService, ShippingService};
pub use tracking::generate_tracking_id;
