//! Persistence for the order aggregate.
//!
//! The store exposes only atomic, single-purpose writes. Ordering between
//! writes, and what a failure between them means, is owned by the caller.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod schema;
pub mod store;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, StoreOperation, WRITE_LOG_CAPACITY};
pub use postgres::PostgresOrderStore;
pub use record::{OrderAggregate, OrderItemRecord, OrderRecord, PaymentRecord, ShipmentRecord};
pub use schema::TableNames;
pub use store::{OrderStore, OrderStoreExt};
