//! Service tests for Products domain
//!
//! Commands run concurrently against the in-memory store to check that the
//! guarded writes keep the invariants under contention.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain_products::*;
use futures_util::StreamExt;
use test_utils::assertions::assert_some;

fn service() -> Arc<ProductService<InMemoryProductRepository>> {
    Arc::new(ProductService::new(InMemoryProductRepository::new()))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_removes_keep_one_public_product() {
    let service = service();
    let mut ids = Vec::new();
    for _ in 0..8 {
        ids.push(service.insert("en").await.unwrap());
    }

    let tasks: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.remove(None, &id).await })
        })
        .collect();

    let mut removed = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => removed += 1,
            Err(ProductError::LastPublicProduct { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(removed, 7);
    assert_eq!(service.public_products().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_make_private_keeps_one_public_product() {
    let service = service();
    let mut ids = Vec::new();
    for _ in 0..6 {
        ids.push(service.insert("en").await.unwrap());
    }

    let tasks: Vec<_> = ids
        .iter()
        .cloned()
        .enumerate()
        .map(|(n, id)| {
            let service = Arc::clone(&service);
            let user = format!("user-{n}");
            tokio::spawn(async move { service.make_private(Some(&user), &id).await })
        })
        .collect();

    let mut privatized = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => privatized += 1,
            Err(ProductError::LastPublicProduct { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(privatized, 5);
    assert_eq!(service.public_products().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_seed_only_when_no_public_product() {
    let service = service();

    let seeded = service.ensure_public_product("Welcome").await.unwrap();
    let seeded = assert_some(seeded, "first call seeds");
    assert_eq!(service.ensure_public_product("Welcome").await.unwrap(), None);

    let public = service.public_products().await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].id, seeded);
    assert_eq!(public[0].name, "Welcome");
}

#[tokio::test]
async fn test_default_locale_applies_to_unknown_locales() {
    let service = ProductService::new(InMemoryProductRepository::new()).with_default_locale("de");

    service.insert("xx").await.unwrap();
    service.insert("it").await.unwrap();

    let names: Vec<_> = service
        .public_products()
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.name)
        .collect();
    assert_eq!(names, ["Produkt A", "Prodotto A"]);
}

#[tokio::test]
async fn test_watch_private_follows_ownership() {
    let service = service();
    let id = service.insert("en").await.unwrap();
    service.insert("en").await.unwrap();

    let mut events = service.watch_private(Some("u1"));
    assert_eq!(events.next().await.unwrap().unwrap(), ViewEvent::Ready(vec![]));

    service.make_private(Some("u1"), &id).await.unwrap();
    match events.next().await.unwrap().unwrap() {
        ViewEvent::Added(view) => {
            assert_eq!(view.id, id);
            assert_eq!(view.owner_id.as_deref(), Some("u1"));
        }
        other => panic!("unexpected {other:?}"),
    }

    // Another user taking the product removes it from u1's view.
    service.make_private(Some("u2"), &id).await.unwrap();
    assert!(matches!(
        events.next().await.unwrap().unwrap(),
        ViewEvent::Removed(_)
    ));

    service.feed().close();
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn test_lagging_watcher_gets_reset() {
    let service = Arc::new(
        ProductService::new(InMemoryProductRepository::new()).with_feed(ChangeFeed::new(2)),
    );
    service.insert("en").await.unwrap();

    let mut events = service.watch_public();
    assert!(matches!(
        events.next().await.unwrap().unwrap(),
        ViewEvent::Ready(views) if views.len() == 1
    ));

    for _ in 0..5 {
        service.insert("en").await.unwrap();
    }

    match events.next().await.unwrap().unwrap() {
        ViewEvent::Reset(views) => assert_eq!(views.len(), 6),
        other => panic!("expected a reset, got {other:?}"),
    }
}

/// In-memory store that holds back the reply to one rename after writing it
struct SlowRename {
    inner: InMemoryProductRepository,
    held_name: String,
    hold_for: Duration,
}

#[async_trait]
impl ProductRepository for SlowRename {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.inner.create(product).await
    }

    async fn get_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        self.inner.get_by_id(id).await
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        self.inner.list(filter).await
    }

    async fn count(&self, filter: ProductFilter) -> ProductResult<u64> {
        self.inner.count(filter).await
    }

    async fn exists_by_name(&self, name: &str) -> ProductResult<bool> {
        self.inner.exists_by_name(name).await
    }

    async fn update_guarded(
        &self,
        id: &str,
        guard: WriteGuard,
        update: ProductUpdate,
    ) -> ProductResult<Guarded<Product>> {
        let hold = update == ProductUpdate::Rename(self.held_name.clone());
        let outcome = self.inner.update_guarded(id, guard, update).await?;
        if hold {
            tokio::time::sleep(self.hold_for).await;
        }
        Ok(outcome)
    }

    async fn delete_guarded(&self, id: &str, guard: WriteGuard) -> ProductResult<Guarded<Product>> {
        self.inner.delete_guarded(id, guard).await
    }
}

#[tokio::test]
async fn test_live_view_keeps_latest_write_when_changes_arrive_out_of_order() {
    let product = Product::new("Product A");
    let id = product.id.clone();
    let service = Arc::new(ProductService::new(SlowRename {
        inner: InMemoryProductRepository::with_products([product]),
        held_name: "X".to_string(),
        hold_for: Duration::from_millis(200),
    }));

    let mut events = service.watch_public();
    assert!(matches!(
        events.next().await.unwrap().unwrap(),
        ViewEvent::Ready(views) if views.len() == 1
    ));

    // "X" is written first but published last.
    let first = {
        let service = Arc::clone(&service);
        let id = id.clone();
        tokio::spawn(async move { service.update_name(None, &id, "X").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    service.update_name(None, &id, "Y").await.unwrap();
    first.await.unwrap().unwrap();

    let stored = service.repository().get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Y");

    match events.next().await.unwrap().unwrap() {
        ViewEvent::Changed(view) => assert_eq!(view.name, "Y"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(
        tokio::time::timeout(Duration::from_millis(100), events.next())
            .await
            .is_err(),
        "the older rename must not reach the view"
    );
}

#[tokio::test]
async fn test_repeated_make_public_is_a_noop() {
    let service = service();
    let id = service.insert("en").await.unwrap();

    let before = service.repository().get_by_id(&id).await.unwrap().unwrap();
    let mut events = service.watch_public();
    assert!(matches!(
        events.next().await.unwrap().unwrap(),
        ViewEvent::Ready(views) if views.len() == 1
    ));

    service.make_public(Some("u1"), &id).await.unwrap();
    service.make_public(Some("u1"), &id).await.unwrap();

    let after = service.repository().get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(after, before);
    assert!(tokio::time::timeout(Duration::from_millis(50), events.next())
        .await
        .is_err());
}
