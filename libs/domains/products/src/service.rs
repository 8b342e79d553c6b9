//! Product Service - commands and visibility queries

use std::sync::Arc;

use futures_util::stream::BoxStream;
use tracing::instrument;

use crate::error::{Command, ProductError, ProductResult};
use crate::feed::{ChangeFeed, FeedEvent, ProductChange};
use crate::live::{Audience, LiveView, ViewEvent};
use crate::models::{Guarded, Product, ProductFilter, ProductUpdate, ProductView, WriteGuard};
use crate::naming;
use crate::repository::ProductRepository;
use crate::rules;

/// Guarded writes re-check authorization this many times before giving up
const MAX_ATTEMPTS: usize = 3;

pub const DEFAULT_LOCALE: &str = "en";

enum Write {
    Update(ProductUpdate),
    Delete,
}

/// Product service providing the commands and visibility queries
///
/// Every command authorizes against the product as loaded, then writes
/// conditionally on the owner it saw. Applied writes are published on the
/// [`ChangeFeed`].
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    feed: ChangeFeed,
    default_locale: String,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            feed: ChangeFeed::default(),
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = feed;
        self
    }

    /// Locale used when a caller's locale has no label
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Create a public product with a default name in `locale`
    #[instrument(skip(self))]
    pub async fn insert(&self, locale: &str) -> ProductResult<String> {
        let base = naming::base_label(locale, &self.default_locale);
        let name = self.next_default_name(base).await?;

        let product = self.create_named(name).await?;
        Ok(product.id)
    }

    /// Create a public product with an explicit name
    #[instrument(skip(self, name))]
    pub async fn create_named(&self, name: impl Into<String> + Send) -> ProductResult<Product> {
        let product = self.repository.create(Product::new(name)).await?;
        self.feed.publish(ProductChange::Inserted(product.clone()));
        Ok(product)
    }

    /// Insert a public product named `name` unless one already exists.
    ///
    /// Returns the new product's id when one was created.
    #[instrument(skip(self))]
    pub async fn ensure_public_product(&self, name: &str) -> ProductResult<Option<String>> {
        if self.repository.count(ProductFilter::Public).await? > 0 {
            return Ok(None);
        }

        let product = self.create_named(name).await?;
        tracing::info!(product_id = %product.id, "Seeded public product");
        Ok(Some(product.id))
    }

    async fn next_default_name(&self, base: &str) -> ProductResult<String> {
        let mut index = 0;
        loop {
            let candidate = naming::candidate(base, index);
            if !self.repository.exists_by_name(&candidate).await? {
                return Ok(candidate);
            }
            index += 1;
        }
    }

    /// Make a product private to the caller
    #[instrument(skip(self))]
    pub async fn make_private(&self, caller: Option<&str>, product_id: &str) -> ProductResult<()> {
        let command = Command::MakePrivate;
        let user_id = caller.ok_or(ProductError::NotAuthenticated { command })?;

        self.run_guarded(
            command,
            product_id,
            |_| Ok(()),
            true,
            Write::Update(ProductUpdate::SetOwner(user_id.to_string())),
        )
        .await
    }

    /// Make a product public
    #[instrument(skip(self))]
    pub async fn make_public(&self, caller: Option<&str>, product_id: &str) -> ProductResult<()> {
        let command = Command::MakePublic;
        if caller.is_none() {
            return Err(ProductError::NotAuthenticated { command });
        }

        self.run_guarded(
            command,
            product_id,
            |product| Self::require_editable(command, product, caller),
            false,
            Write::Update(ProductUpdate::ClearOwner),
        )
        .await
    }

    /// Rename a product
    #[instrument(skip(self))]
    pub async fn update_name(
        &self,
        caller: Option<&str>,
        product_id: &str,
        new_name: &str,
    ) -> ProductResult<()> {
        let command = Command::UpdateName;

        self.run_guarded(
            command,
            product_id,
            |product| Self::require_editable(command, product, caller),
            false,
            Write::Update(ProductUpdate::Rename(new_name.to_string())),
        )
        .await
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn remove(&self, caller: Option<&str>, product_id: &str) -> ProductResult<()> {
        let command = Command::Remove;

        self.run_guarded(
            command,
            product_id,
            |product| Self::require_editable(command, product, caller),
            true,
            Write::Delete,
        )
        .await
    }

    fn require_editable(
        command: Command,
        product: &Product,
        caller: Option<&str>,
    ) -> ProductResult<()> {
        if rules::editable_by(product, caller) {
            Ok(())
        } else {
            Err(ProductError::AccessDenied { command })
        }
    }

    /// Load, authorize, check the last-public rule, then write guarded on
    /// the owner that was authorized. A concurrent owner change restarts
    /// the sequence. Updates that would change nothing succeed without a
    /// write.
    async fn run_guarded<F>(
        &self,
        command: Command,
        product_id: &str,
        authorize: F,
        keep_public: bool,
        write: Write,
    ) -> ProductResult<()>
    where
        F: Fn(&Product) -> ProductResult<()>,
    {
        let not_found = || ProductError::NotFound {
            command,
            id: product_id.to_string(),
        };

        for attempt in 1..=MAX_ATTEMPTS {
            let current = self
                .repository
                .get_by_id(product_id)
                .await?
                .ok_or_else(not_found)?;

            authorize(&current)?;

            if matches!(&write, Write::Update(update) if update.is_noop(&current)) {
                tracing::debug!(%command, product_id, "Nothing to change");
                return Ok(());
            }

            if keep_public
                && rules::is_last_public_product(&current, self.repository.as_ref()).await?
            {
                return Err(ProductError::LastPublicProduct { command });
            }

            let mut guard = WriteGuard::owner(current.owner_id.clone());
            if keep_public {
                guard = guard.keep_public();
            }

            let outcome = match &write {
                Write::Update(update) => self
                    .repository
                    .update_guarded(product_id, guard, update.clone())
                    .await?
                    .map(ProductChange::Updated),
                Write::Delete => self
                    .repository
                    .delete_guarded(product_id, guard)
                    .await?
                    .map(ProductChange::Removed),
            };

            match outcome {
                Guarded::Applied(change) => {
                    self.feed.publish(change);
                    tracing::info!(%command, product_id, "Command applied");
                    return Ok(());
                }
                Guarded::Missing => return Err(not_found()),
                Guarded::LastPublic => return Err(ProductError::LastPublicProduct { command }),
                Guarded::OwnerChanged => {
                    tracing::debug!(
                        %command,
                        product_id,
                        attempt,
                        "Owner changed concurrently, re-checking"
                    );
                }
            }
        }

        tracing::warn!(%command, product_id, "Giving up after repeated concurrent owner changes");
        Err(ProductError::Conflict {
            command,
            id: product_id.to_string(),
        })
    }

    /// Snapshot of all public products
    #[instrument(skip(self))]
    pub async fn public_products(&self) -> ProductResult<Vec<ProductView>> {
        self.snapshot(&Audience::Public).await
    }

    /// Snapshot of the caller's private products; empty for anonymous callers
    #[instrument(skip(self))]
    pub async fn private_products(&self, caller: Option<&str>) -> ProductResult<Vec<ProductView>> {
        match caller {
            Some(user_id) => self.snapshot(&Audience::Owner(user_id.to_string())).await,
            None => Ok(Vec::new()),
        }
    }

    async fn snapshot(&self, audience: &Audience) -> ProductResult<Vec<ProductView>> {
        let products = self.repository.list(audience.filter()).await?;
        Ok(products.into_iter().map(ProductView::from).collect())
    }
}

impl<R: ProductRepository + 'static> ProductService<R> {
    /// Live view of the public products
    pub fn watch_public(&self) -> BoxStream<'static, ProductResult<ViewEvent>> {
        self.watch(Audience::Public)
    }

    /// Live view of the caller's private products.
    ///
    /// Anonymous callers get an empty, complete snapshot and nothing else.
    pub fn watch_private(
        &self,
        caller: Option<&str>,
    ) -> BoxStream<'static, ProductResult<ViewEvent>> {
        match caller {
            Some(user_id) => self.watch(Audience::Owner(user_id.to_string())),
            None => Box::pin(futures_util::stream::once(async {
                Ok::<_, ProductError>(ViewEvent::Ready(Vec::new()))
            })),
        }
    }

    /// Snapshot, then changes until the feed closes or the stream is dropped.
    ///
    /// The subscription is taken before the snapshot is read, so no write
    /// can fall between the two.
    pub fn watch(&self, audience: Audience) -> BoxStream<'static, ProductResult<ViewEvent>> {
        let repository = Arc::clone(&self.repository);
        let mut subscription = self.feed.subscribe();

        Box::pin(async_stream::try_stream! {
            let mut view = LiveView::new(audience);

            let snapshot = repository.list(view.audience().filter()).await?;
            yield ViewEvent::Ready(view.load(snapshot));

            loop {
                match subscription.recv().await {
                    FeedEvent::Change(change) => {
                        if let Some(event) = view.apply(&change) {
                            yield event;
                        }
                    }
                    FeedEvent::Lagged(missed) => {
                        tracing::warn!(
                            missed,
                            audience = ?view.audience(),
                            "Live view fell behind, resending snapshot"
                        );
                        let snapshot = repository.list(view.audience().filter()).await?;
                        yield ViewEvent::Reset(view.load(snapshot));
                    }
                    FeedEvent::Closed => break,
                }
            }
        })
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            feed: self.feed.clone(),
            default_locale: self.default_locale.clone(),
        }
    }
}
