//! Change feed: every applied product write, fanned out to live views.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::models::Product;

pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// A write that changed the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductChange {
    Inserted(Product),
    /// The product as it is after the write
    Updated(Product),
    /// The product as it was before deletion
    Removed(Product),
}

impl ProductChange {
    pub fn product(&self) -> &Product {
        match self {
            Self::Inserted(p) | Self::Updated(p) | Self::Removed(p) => p,
        }
    }

    /// Revision of the product after this change.
    ///
    /// Publishing happens after the store write returns, so changes to one
    /// product can reach subscribers out of order. Comparing revisions puts
    /// them back in store order. A removal counts as one write past the
    /// deleted document.
    pub fn rev(&self) -> i64 {
        match self {
            Self::Inserted(p) | Self::Updated(p) => p.rev,
            Self::Removed(p) => p.rev + 1,
        }
    }
}

/// Broadcasts [`ProductChange`]s to all subscribers.
///
/// Cloning shares the channel. Closing ends every subscription, which is
/// how live views are finished on shutdown.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Arc<ProductChange>>,
    closed: Arc<watch::Sender<bool>>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        let (closed, _) = watch::channel(false);
        Self {
            tx,
            closed: Arc::new(closed),
        }
    }

    pub fn publish(&self, change: ProductChange) {
        // No subscribers is fine: nobody is watching.
        let delivered = self.tx.send(Arc::new(change)).unwrap_or(0);
        tracing::trace!(delivered, "Product change published");
    }

    pub fn subscribe(&self) -> FeedSubscription {
        FeedSubscription {
            rx: self.tx.subscribe(),
            closed: self.closed.subscribe(),
        }
    }

    pub fn close(&self) {
        self.closed.send_replace(true);
        tracing::info!(subscribers = self.tx.receiver_count(), "Change feed closed");
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

#[derive(Debug)]
pub enum FeedEvent {
    Change(Arc<ProductChange>),
    /// The subscriber fell behind and this many changes were dropped
    Lagged(u64),
    Closed,
}

pub struct FeedSubscription {
    rx: broadcast::Receiver<Arc<ProductChange>>,
    closed: watch::Receiver<bool>,
}

impl FeedSubscription {
    pub async fn recv(&mut self) -> FeedEvent {
        if *self.closed.borrow() {
            return FeedEvent::Closed;
        }

        tokio::select! {
            received = self.rx.recv() => match received {
                Ok(change) => FeedEvent::Change(change),
                Err(broadcast::error::RecvError::Lagged(missed)) => FeedEvent::Lagged(missed),
                Err(broadcast::error::RecvError::Closed) => FeedEvent::Closed,
            },
            _ = self.closed.wait_for(|closed| *closed) => FeedEvent::Closed,
        }
    }
}
