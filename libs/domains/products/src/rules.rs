//! Authorization and invariant checks shared by the commands.

use crate::error::ProductResult;
use crate::models::{Product, ProductFilter};
use crate::repository::ProductRepository;

/// Whether `caller` may change `product`.
///
/// Public products are editable by everyone, including anonymous callers.
/// Private products only by their owner.
pub fn editable_by(product: &Product, caller: Option<&str>) -> bool {
    match product.owner_id.as_deref() {
        None => true,
        Some(owner) => caller == Some(owner),
    }
}

/// Whether `product` is the only public product, given the current count
/// of public products.
pub fn counts_as_last_public(product: &Product, public_count: u64) -> bool {
    product.is_public() && public_count == 1
}

/// Like [`counts_as_last_public`], querying the store for the count.
///
/// Private products never query the store.
pub async fn is_last_public_product<R>(product: &Product, repository: &R) -> ProductResult<bool>
where
    R: ProductRepository + ?Sized,
{
    if !product.is_public() {
        return Ok(false);
    }
    let public_count = repository.count(ProductFilter::Public).await?;
    Ok(counts_as_last_public(product, public_count))
}
