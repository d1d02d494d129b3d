//! Shipping service trait and in-memory implementation.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Address, CartItem, Money};
use parking_lot::RwLock;

use super::tracking::generate_tracking_id;
use crate::error::ServiceError;

/// Trait for quoting and dispatching shipments.
#[async_trait]
pub trait ShippingService: Send + Sync {
    /// Returns the USD cost of shipping `items` to `address`.
    async fn get_quote(&self, address: &Address, items: &[CartItem]) -> Result<Money, ServiceError>;

    /// Hands the items to the carrier and returns a tracking id.
    async fn ship_order(&self, address: &Address, items: &[CartItem])
    -> Result<String, ServiceError>;
}

#[derive(Debug)]
struct InMemoryShippingState {
    quote: Money,
    fail_on_quote: bool,
    fail_on_ship: bool,
    shipped: HashSet<String>,
}

/// In-memory shipping service with a flat quote.
#[derive(Debug, Clone)]
pub struct InMemoryShippingService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingService {
    /// Creates a service quoting `quote` (USD) for every shipment.
    pub fn new(quote: Money) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryShippingState {
                quote,
                fail_on_quote: false,
                fail_on_ship: false,
                shipped: HashSet::new(),
            })),
        }
    }

    /// Replaces the flat quote.
    pub fn set_quote(&self, quote: Money) {
        self.state.write().quote = quote;
    }

    /// Configures `get_quote` to fail as unreachable.
    pub fn set_fail_on_quote(&self, fail: bool) {
        self.state.write().fail_on_quote = fail;
    }

    /// Configures `ship_order` to fail as unreachable.
    pub fn set_fail_on_ship(&self, fail: bool) {
        self.state.write().fail_on_ship = fail;
    }

    /// Returns the number of dispatched shipments.
    pub fn shipment_count(&self) -> usize {
        self.state.read().shipped.len()
    }

    /// Returns true if `tracking_id` was issued by this service.
    pub fn has_shipment(&self, tracking_id: &str) -> bool {
        self.state.read().shipped.contains(tracking_id)
    }
}

#[async_trait]
impl ShippingService for InMemoryShippingService {
    async fn get_quote(&self, _address: &Address, items: &[CartItem]) -> Result<Money, ServiceError> {
        let state = self.state.read();
        if state.fail_on_quote {
            return Err(ServiceError::Unavailable(
                "shipping service unreachable".to_string(),
            ));
        }
        if items.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "cannot quote an empty shipment".to_string(),
            ));
        }
        Ok(state.quote.clone())
    }

    async fn ship_order(
        &self,
        address: &Address,
        items: &[CartItem],
    ) -> Result<String, ServiceError> {
        let mut state = self.state.write();
        if state.fail_on_ship {
            return Err(ServiceError::Unavailable(
                "shipping service unreachable".to_string(),
            ));
        }
        if items.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "cannot ship an empty order".to_string(),
            ));
        }

        let tracking_id = generate_tracking_id(&address.to_string());
        state.shipped.insert(tracking_id.clone());
        Ok(tracking_id)
    }
}
