//! Cart service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::CartItem;
use parking_lot::RwLock;

use crate::error::ServiceError;

/// Trait for reading and clearing user carts.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Returns the user's cart lines. A user with no cart has an empty one.
    async fn get_cart(&self, user_id: &str) -> Result<Vec<CartItem>, ServiceError>;

    /// Removes every line from the user's cart.
    async fn empty_cart(&self, user_id: &str) -> Result<(), ServiceError>;

    /// Adds a line, merging quantities for a product already in the cart.
    async fn add_item(&self, user_id: &str, item: CartItem) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<String, Vec<CartItem>>,
    fail_on_get: bool,
    fail_on_empty: bool,
}

/// In-memory cart service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartService {
    /// Creates a new in-memory cart service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures `get_cart` to fail as unreachable.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().fail_on_get = fail;
    }

    /// Configures `empty_cart` to fail as unreachable.
    pub fn set_fail_on_empty(&self, fail: bool) {
        self.state.write().fail_on_empty = fail;
    }

    /// Returns the number of lines in the user's cart.
    pub fn line_count(&self, user_id: &str) -> usize {
        self.state.read().carts.get(user_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn get_cart(&self, user_id: &str) -> Result<Vec<CartItem>, ServiceError> {
        let state = self.state.read();
        if state.fail_on_get {
            return Err(ServiceError::Unavailable("cart service unreachable".to_string()));
        }
        Ok(state.carts.get(user_id).cloned().unwrap_or_default())
    }

    async fn empty_cart(&self, user_id: &str) -> Result<(), ServiceError> {
        let mut state = self.state.write();
        if state.fail_on_empty {
            return Err(ServiceError::Unavailable("cart service unreachable".to_string()));
        }
        state.carts.remove(user_id);
        Ok(())
    }

    async fn add_item(&self, user_id: &str, item: CartItem) -> Result<(), ServiceError> {
        if item.quantity == 0 {
            return Err(ServiceError::InvalidArgument(format!(
                "quantity for {} must be positive",
                item.product_id
            )));
        }

        let mut state = self.state.write();
        let cart = state.carts.entry(user_id.to_string()).or_default();
        match cart.iter_mut().find(|line| line.product_id == item.product_id) {
            Some(line) => {
                line.quantity = line.quantity.checked_add(item.quantity).ok_or_else(|| {
                    ServiceError::InvalidArgument(format!("quantity overflow for {}", item.product_id))
                })?;
            }
            None => cart.push(item),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_user_has_empty_cart() {
        let service = InMemoryCartService::new();
        assert!(service.get_cart("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_merges_quantities() {
        let service = InMemoryCartService::new();
        service.add_item("u1", CartItem::new("P1", 2)).await.unwrap();
        service.add_item("u1", CartItem::new("P2", 1)).await.unwrap();
        service.add_item("u1", CartItem::new("P1", 3)).await.unwrap();

        let cart = service.get_cart("u1").await.unwrap();
        assert_eq!(cart, vec![CartItem::new("P1", 5), CartItem::new("P2", 1)]);
    }

    #[tokio::test]
    async fn test_add_rejects_zero_quantity() {
        let service = InMemoryCartService::new();
        let result = service.add_item("u1", CartItem::new("P1", 0)).await;
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let service = InMemoryCartService::new();
        service.add_item("u1", CartItem::new("P1", 1)).await.unwrap();
        service.empty_cart("u1").await.unwrap();
        assert_eq!(service.line_count("u1"), 0);
    }

    #[tokio::test]
    async fn test_fail_flags() {
        let service = InMemoryCartService::new();
        service.set_fail_on_get(true);
        service.set_fail_on_empty(true);

        assert!(matches!(
            service.get_cart("u1").await,
            Err(ServiceError::Unavailable(_))
        ));
        assert!(matches!(
            service.empty_cart("u1").await,
            Err(ServiceError::Unavailable(_))
        ));
    }
}
