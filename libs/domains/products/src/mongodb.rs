//! MongoDB implementation of ProductRepository
//!
//! Owner guards are enforced by the write filter itself, so a guarded write
//! is atomic per document. `keep_public` is not: the public count is a
//! separate query issued by the service before the write.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::instrument;

use crate::error::ProductResult;
use crate::models::{Guarded, Product, ProductFilter, ProductUpdate, WriteGuard};
use crate::repository::ProductRepository;

pub const COLLECTION_NAME: &str = "products";

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION_NAME)
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for the visibility queries and name lookups
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "userId": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_user_id".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(IndexOptions::builder().name("idx_name".to_string()).build())
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    fn owner_condition(owner: Option<&str>) -> mongodb::bson::Bson {
        match owner {
            Some(user_id) => user_id.into(),
            None => doc! { "$exists": false }.into(),
        }
    }

    fn build_filter(filter: &ProductFilter) -> Document {
        match filter {
            ProductFilter::All => doc! {},
            ProductFilter::Public => doc! { "userId": Self::owner_condition(None) },
            ProductFilter::OwnedBy(user_id) => {
                doc! { "userId": Self::owner_condition(Some(user_id)) }
            }
        }
    }

    fn guard_filter(id: &str, guard: &WriteGuard) -> Document {
        doc! {
            "_id": id,
            "userId": Self::owner_condition(guard.expected_owner.as_deref()),
        }
    }

    /// The update, plus a `rev` bump applied in the same operation
    fn update_document(update: &ProductUpdate) -> Document {
        let mut document = match update {
            ProductUpdate::SetOwner(user_id) => doc! { "$set": { "userId": user_id } },
            ProductUpdate::ClearOwner => doc! { "$unset": { "userId": true } },
            ProductUpdate::Rename(name) => doc! { "$set": { "name": name } },
        };
        document.insert("$inc", doc! { "rev": 1_i64 });
        document
    }

    /// Explains why a guarded write matched nothing
    async fn miss_reason<T>(&self, id: &str) -> ProductResult<Guarded<T>> {
        Ok(match self.get_by_id(id).await? {
            Some(_) => Guarded::OwnerChanged,
            None => Guarded::Missing,
        })
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(
        skip(self, product),
        fields(product_id = %product.id, product_name = %product.name)
    )]
    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.collection.insert_one(&product).await?;

        tracing::info!("Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();

        let cursor = self
            .collection
            .find(Self::build_filter(&filter))
            .with_options(options)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(&filter))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn exists_by_name(&self, name: &str) -> ProductResult<bool> {
        let count = self.collection.count_documents(doc! { "name": name }).await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn update_guarded(
        &self,
        id: &str,
        guard: WriteGuard,
        update: ProductUpdate,
    ) -> ProductResult<Guarded<Product>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(Self::guard_filter(id, &guard), Self::update_document(&update))
            .with_options(options)
            .await?;

        match updated {
            Some(product) => {
                tracing::info!(product_id = %id, "Product updated successfully");
                Ok(Guarded::Applied(product))
            }
            None => self.miss_reason(id).await,
        }
    }

    #[instrument(skip(self))]
    async fn delete_guarded(&self, id: &str, guard: WriteGuard) -> ProductResult<Guarded<Product>> {
        let deleted = self
            .collection
            .find_one_and_delete(Self::guard_filter(id, &guard))
            .await?;

        match deleted {
            Some(product) => {
                tracing::info!(product_id = %id, "Product deleted successfully");
                Ok(Guarded::Applied(product))
            }
            None => self.miss_reason(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_all() {
        assert!(MongoProductRepository::build_filter(&ProductFilter::All).is_empty());
    }

    #[test]
    fn test_build_filter_public() {
        let doc = MongoProductRepository::build_filter(&ProductFilter::Public);
        assert_eq!(doc, doc! { "userId": { "$exists": false } });
    }

    #[test]
    fn test_build_filter_owned_by() {
        let doc = MongoProductRepository::build_filter(&ProductFilter::OwnedBy("u1".into()));
        assert_eq!(doc, doc! { "userId": "u1" });
    }

    #[test]
    fn test_guard_filter_pins_owner() {
        let public = MongoProductRepository::guard_filter("p1", &WriteGuard::owner(None));
        assert_eq!(public, doc! { "_id": "p1", "userId": { "$exists": false } });

        let private =
            MongoProductRepository::guard_filter("p1", &WriteGuard::owner(Some("u1".into())));
        assert_eq!(private, doc! { "_id": "p1", "userId": "u1" });
    }

    #[test]
    fn test_update_documents() {
        assert_eq!(
            MongoProductRepository::update_document(&ProductUpdate::ClearOwner),
            doc! { "$unset": { "userId": true }, "$inc": { "rev": 1_i64 } }
        );
        assert_eq!(
            MongoProductRepository::update_document(&ProductUpdate::Rename("Groceries".into())),
            doc! { "$set": { "name": "Groceries" }, "$inc": { "rev": 1_i64 } }
        );
    }
}
