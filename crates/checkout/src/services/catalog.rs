//! Product catalog trait and in-memory implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Product, ProductId};
use parking_lot::RwLock;

use crate::error::ServiceError;

/// Trait for looking up products and their USD prices.
#[async_trait]
pub trait ProductCatalogService: Send + Sync {
    /// Returns one product, or `NotFound`.
    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError>;

    /// Returns every product, ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, ServiceError>;

    /// Returns products whose name or description contains `query`,
    /// ignoring case.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: BTreeMap<String, Product>,
    fail_on_get: bool,
    lookups: usize,
}

/// In-memory product catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryProductCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.add_product(product);
        }
        catalog
    }

    /// Adds or replaces a product.
    pub fn add_product(&self, product: Product) {
        self.state
            .write()
            .products
            .insert(product.id.as_str().to_string(), product);
    }

    /// Configures `get_product` to fail as unreachable.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().fail_on_get = fail;
    }

    /// Returns how many times `get_product` was called.
    pub fn lookup_count(&self) -> usize {
        self.state.read().lookups
    }
}

#[async_trait]
impl ProductCatalogService for InMemoryProductCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        let mut state = self.state.write();
        state.lookups += 1;

        if state.fail_on_get {
            return Err(ServiceError::Unavailable(
                "product catalog unreachable".to_string(),
            ));
        }

        state
            .products
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("no product with ID {id}")))
    }

    async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.state.read().products.values().cloned().collect())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, ServiceError> {
        let needle = query.to_lowercase();
        Ok(self
            .state
            .read()
            .products
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}
