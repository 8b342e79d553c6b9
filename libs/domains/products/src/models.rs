use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Product entity - a named list container stored in MongoDB
///
/// A product without an owner is public: everyone can see and edit it.
/// A product with an owner is private to that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Number of unfinished items in the list; never touched by commands
    #[serde(rename = "incompleteCount", default)]
    pub incomplete_count: i64,
    /// Owning user, absent for public products
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Bumped by every write, in the same operation as the write
    #[serde(default)]
    pub rev: i64,
}

impl Product {
    /// A new public product with a time-ordered id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            incomplete_count: 0,
            owner_id: None,
            rev: 0,
        }
    }

    pub fn is_public(&self) -> bool {
        self.owner_id.is_none()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }
}

/// The published projection of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    /// Product ID
    #[schema(example = "0192b1d4-6c1e-7c8a-9f3e-2b1d4c6e8a9f")]
    pub id: String,
    #[schema(example = "Product A")]
    pub name: String,
    pub incomplete_count: i64,
    /// Present only on private products
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            incomplete_count: product.incomplete_count,
            owner_id: product.owner_id.clone(),
        }
    }
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            incomplete_count: product.incomplete_count,
            owner_id: product.owner_id,
        }
    }
}

/// Which products a query selects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProductFilter {
    #[default]
    All,
    /// Products without an owner
    Public,
    /// Products owned by the given user
    OwnedBy(String),
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Public => product.is_public(),
            Self::OwnedBy(user_id) => product.is_owned_by(user_id),
        }
    }
}

/// A single field change applied by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductUpdate {
    SetOwner(String),
    ClearOwner,
    Rename(String),
}

impl ProductUpdate {
    /// Whether applying this to `product` would leave it as it is
    pub fn is_noop(&self, product: &Product) -> bool {
        match self {
            Self::SetOwner(user_id) => product.is_owned_by(user_id),
            Self::ClearOwner => product.is_public(),
            Self::Rename(name) => product.name == *name,
        }
    }

    pub fn apply(&self, product: &mut Product) {
        match self {
            Self::SetOwner(user_id) => product.owner_id = Some(user_id.clone()),
            Self::ClearOwner => product.owner_id = None,
            Self::Rename(name) => product.name = name.clone(),
        }
    }
}

/// Condition a store must verify atomically with a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteGuard {
    /// Owner observed when the command was authorized
    pub expected_owner: Option<String>,
    /// Refuse the write if it would leave no public product
    pub keep_public: bool,
}

impl WriteGuard {
    pub fn owner(expected_owner: Option<String>) -> Self {
        Self {
            expected_owner,
            keep_public: false,
        }
    }

    pub fn keep_public(mut self) -> Self {
        self.keep_public = true;
        self
    }
}

/// Outcome of a guarded write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Applied(T),
    Missing,
    /// The owner no longer matches the guard
    OwnerChanged,
    /// The write would remove the last public product
    LastPublic,
}

impl<T> Guarded<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Guarded<U> {
        match self {
            Self::Applied(value) => Guarded::Applied(f(value)),
            Self::Missing => Guarded::Missing,
            Self::OwnerChanged => Guarded::OwnerChanged,
            Self::LastPublic => Guarded::LastPublic,
        }
    }
}

/// Response body of `insert`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertedProduct {
    pub product_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_new_product_is_public_and_empty() {
        let product = Product::new("Product A");
        assert!(product.is_public());
        assert_eq!(product.incomplete_count, 0);
        assert!(Uuid::parse_str(&product.id).is_ok());
    }

    #[test]
    fn test_document_field_names() {
        let mut product = Product::new("Product A");
        product.owner_id = Some("u1".to_string());

        let doc = bson::to_document(&product).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), product.id);
        assert_eq!(doc.get_str("userId").unwrap(), "u1");
        assert_eq!(doc.get_i64("incompleteCount").unwrap(), 0);
    }

    #[test]
    fn test_public_product_has_no_user_id_field() {
        let doc = bson::to_document(&Product::new("Product A")).unwrap();
        assert!(!doc.contains_key("userId"));
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let product: Product =
            bson::from_document(bson::doc! { "_id": "p1", "name": "Old" }).unwrap();
        assert_eq!(product.incomplete_count, 0);
        assert_eq!(product.rev, 0);
        assert!(product.is_public());
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let mut product = Product::new("Product A");
        product.owner_id = Some("u1".to_string());

        let json = serde_json::to_value(ProductView::from(&product)).unwrap();
        assert_eq!(json["ownerId"], "u1");
        assert_eq!(json["incompleteCount"], 0);
        assert!(json.get("_id").is_none());
    }

    #[test]
    fn test_filter_matches() {
        let public = Product::new("A");
        let mut private = Product::new("B");
        private.owner_id = Some("u1".to_string());

        assert!(ProductFilter::Public.matches(&public));
        assert!(!ProductFilter::Public.matches(&private));
        assert!(ProductFilter::OwnedBy("u1".into()).matches(&private));
        assert!(!ProductFilter::OwnedBy("u2".into()).matches(&private));
        assert!(ProductFilter::All.matches(&private));
    }

    #[test]
    fn test_update_apply() {
        let mut product = Product::new("A");
        ProductUpdate::SetOwner("u1".into()).apply(&mut product);
        assert!(product.is_owned_by("u1"));
        ProductUpdate::Rename("Groceries".into()).apply(&mut product);
        assert_eq!(product.name, "Groceries");
        ProductUpdate::ClearOwner.apply(&mut product);
        assert!(product.is_public());
    }

    #[test]
    fn test_update_is_noop() {
        let mut product = Product::new("A");
        assert!(ProductUpdate::ClearOwner.is_noop(&product));
        assert!(ProductUpdate::Rename("A".into()).is_noop(&product));
        assert!(!ProductUpdate::SetOwner("u1".into()).is_noop(&product));

        product.owner_id = Some("u1".into());
        assert!(ProductUpdate::SetOwner("u1".into()).is_noop(&product));
        assert!(!ProductUpdate::SetOwner("u2".into()).is_noop(&product));
        assert!(!ProductUpdate::ClearOwner.is_noop(&product));
    }
}
