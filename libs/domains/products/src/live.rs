//! Live views: a snapshot of the products an audience may see, kept current
//! from the change feed.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::feed::ProductChange;
use crate::models::{Product, ProductFilter, ProductView};

/// Who a view is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Everyone: products without an owner
    Public,
    /// A signed-in user: that user's private products
    Owner(String),
}

impl Audience {
    pub fn filter(&self) -> ProductFilter {
        match self {
            Self::Public => ProductFilter::Public,
            Self::Owner(user_id) => ProductFilter::OwnedBy(user_id.clone()),
        }
    }

    pub fn sees(&self, product: &Product) -> bool {
        self.filter().matches(product)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedProduct {
    pub id: String,
}

/// What a live view subscriber receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Initial snapshot, complete
    Ready(Vec<ProductView>),
    Added(ProductView),
    Changed(ProductView),
    Removed(RemovedProduct),
    /// Fresh snapshot after the subscriber fell behind the feed
    Reset(Vec<ProductView>),
}

impl ViewEvent {
    /// Event name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Added(_) => "added",
            Self::Changed(_) => "changed",
            Self::Removed(_) => "removed",
            Self::Reset(_) => "reset",
        }
    }

    pub fn payload(&self) -> Value {
        let value = match self {
            Self::Ready(views) | Self::Reset(views) => serde_json::to_value(views),
            Self::Added(view) | Self::Changed(view) => serde_json::to_value(view),
            Self::Removed(removed) => serde_json::to_value(removed),
        };
        value.unwrap_or(Value::Null)
    }
}

/// The products one subscriber currently sees.
///
/// Turns raw feed changes into membership events. A change is applied only
/// when its revision is newer than the last one seen for that product, so
/// late deliveries and changes already in the snapshot are dropped.
pub struct LiveView {
    audience: Audience,
    known: HashMap<String, ProductView>,
    /// Last revision seen per product id, including products outside the
    /// audience and removed ones
    revs: HashMap<String, i64>,
}

impl LiveView {
    pub fn new(audience: Audience) -> Self {
        Self {
            audience,
            known: HashMap::new(),
            revs: HashMap::new(),
        }
    }

    pub fn audience(&self) -> &Audience {
        &self.audience
    }

    /// Replaces the known set with `snapshot` and returns its views
    pub fn load(&mut self, snapshot: Vec<Product>) -> Vec<ProductView> {
        for product in &snapshot {
            self.observe(&product.id, product.rev);
        }

        let views: Vec<ProductView> = snapshot
            .into_iter()
            .filter(|p| self.audience.sees(p))
            .map(ProductView::from)
            .collect();

        self.known = views.iter().map(|v| (v.id.clone(), v.clone())).collect();
        views
    }

    pub fn apply(&mut self, change: &ProductChange) -> Option<ViewEvent> {
        let id = &change.product().id;
        if self.revs.get(id).is_some_and(|&seen| change.rev() <= seen) {
            tracing::trace!(product_id = %id, rev = change.rev(), "Dropping stale change");
            return None;
        }
        self.observe(id, change.rev());

        match change {
            ProductChange::Inserted(product) | ProductChange::Updated(product) => {
                if self.audience.sees(product) {
                    self.upsert(ProductView::from(product))
                } else {
                    self.forget(&product.id)
                }
            }
            ProductChange::Removed(product) => self.forget(&product.id),
        }
    }

    fn observe(&mut self, id: &str, rev: i64) {
        let seen = self.revs.entry(id.to_string()).or_insert(rev);
        *seen = (*seen).max(rev);
    }

    fn upsert(&mut self, view: ProductView) -> Option<ViewEvent> {
        match self.known.insert(view.id.clone(), view.clone()) {
            None => Some(ViewEvent::Added(view)),
            Some(previous) if previous != view => Some(ViewEvent::Changed(view)),
            Some(_) => None,
        }
    }

    fn forget(&mut self, id: &str) -> Option<ViewEvent> {
        self.known
            .remove(id)
            .map(|_| ViewEvent::Removed(RemovedProduct { id: id.to_string() }))
    }
}
