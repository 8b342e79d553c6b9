use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{Guarded, Product, ProductFilter, ProductUpdate, WriteGuard};

/// Repository trait for Product persistence
///
/// Ownership-sensitive writes go through [`update_guarded`] and
/// [`delete_guarded`], which only apply when the product's owner still
/// matches the [`WriteGuard`].
///
/// [`update_guarded`]: ProductRepository::update_guarded
/// [`delete_guarded`]: ProductRepository::delete_guarded
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Store a new product as given
    async fn create(&self, product: Product) -> ProductResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: &str) -> ProductResult<Option<Product>>;

    /// List products matching a filter, oldest first
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    /// Count products matching a filter
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64>;

    /// Check if any product has this exact name
    async fn exists_by_name(&self, name: &str) -> ProductResult<bool>;

    /// Apply `update` if `guard` holds; returns the updated product
    async fn update_guarded(
        &self,
        id: &str,
        guard: WriteGuard,
        update: ProductUpdate,
    ) -> ProductResult<Guarded<Product>>;

    /// Delete the product if `guard` holds; returns the deleted product
    async fn delete_guarded(&self, id: &str, guard: WriteGuard) -> ProductResult<Guarded<Product>>;
}
