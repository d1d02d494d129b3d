//! Order aggregate building blocks.

pub mod money;
pub mod state;
pub mod value_objects;

pub use money::{Money, NANOS_PER_UNIT, is_valid_currency_code};
pub use state::{OrderStatus, PaymentStatus, ShipmentStatus};
pub use value_objects::{Address, CartItem, CreditCardInfo, OrderItem, Product, ProductId};
