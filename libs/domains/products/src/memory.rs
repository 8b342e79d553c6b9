//! In-memory implementation of ProductRepository, for tests and local runs.
//!
//! All checks of a guarded write, including the last-public rule, happen
//! under a single write lock.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::ProductResult;
use crate::models::{Guarded, Product, ProductFilter, ProductUpdate, WriteGuard};
use crate::repository::ProductRepository;

/// Products keyed by id. Ids are UUID v7 strings, so key order is
/// creation order.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of products
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            products: RwLock::new(products),
        }
    }

    /// The reason a guarded write must not apply, if any
    fn check<T>(
        products: &BTreeMap<String, Product>,
        id: &str,
        guard: &WriteGuard,
        removes_public: bool,
    ) -> Option<Guarded<T>> {
        let Some(current) = products.get(id) else {
            return Some(Guarded::Missing);
        };
        if current.owner_id != guard.expected_owner {
            return Some(Guarded::OwnerChanged);
        }
        if guard.keep_public && removes_public && current.is_public() {
            let public_count = products.values().filter(|p| p.is_public()).count();
            if public_count == 1 {
                return Some(Guarded::LastPublic);
            }
        }
        None
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn get_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn exists_by_name(&self, name: &str) -> ProductResult<bool> {
        Ok(self.products.read().await.values().any(|p| p.name == name))
    }

    #[instrument(skip(self))]
    async fn update_guarded(
        &self,
        id: &str,
        guard: WriteGuard,
        update: ProductUpdate,
    ) -> ProductResult<Guarded<Product>> {
        let mut products = self.products.write().await;

        let removes_public = matches!(update, ProductUpdate::SetOwner(_));
        if let Some(miss) = Self::check(&products, id, &guard, removes_public) {
            return Ok(miss);
        }

        let Some(product) = products.get_mut(id) else {
            return Ok(Guarded::Missing);
        };
        update.apply(product);
        product.rev += 1;
        Ok(Guarded::Applied(product.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_guarded(&self, id: &str, guard: WriteGuard) -> ProductResult<Guarded<Product>> {
        let mut products = self.products.write().await;

        if let Some(miss) = Self::check(&products, id, &guard, true) {
            return Ok(miss);
        }

        Ok(match products.remove(id) {
            Some(product) => Guarded::Applied(product),
            None => Guarded::Missing,
        })
    }
}
