//! Products Domain
//!
//! Product lists with public/private visibility. Public products are visible
//! to and editable by everyone; private products only by their owner. At
//! least one public product always exists.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP commands, snapshots, SSE live views
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │   Service   │ ──► │ Change feed │ ──► live views
//! └──────┬──────┘     └─────────────┘
//!        │  args → rules → guarded write
//! ┌──────▼──────┐
//! │ Repository  │  ← trait + MongoDB and in-memory implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Product, ProductView, filters, guards
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{ConnectionRateLimiter, RateLimitConfig};
//! use domain_products::{handlers, MongoProductRepository, ProductService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("products");
//!
//! let service = ProductService::new(MongoProductRepository::new(&db));
//! let limiter = ConnectionRateLimiter::new(&RateLimitConfig::default())?;
//!
//! let router = handlers::router(service, limiter);
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod live;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod naming;
pub mod repository;
pub mod rules;
pub mod service;

// Re-export commonly used types
pub use args::{Args, InsertArgs, ProductIdArgs, UpdateNameArgs};
pub use error::{Command, ProductError, ProductResult};
pub use feed::{ChangeFeed, ProductChange, DEFAULT_FEED_CAPACITY};
pub use handlers::ApiDoc;
pub use live::{Audience, ViewEvent};
pub use memory::InMemoryProductRepository;
pub use models::{
    Guarded, InsertedProduct, Product, ProductFilter, ProductUpdate, ProductView, WriteGuard,
};
pub use mongodb::MongoProductRepository;
pub use repository::ProductRepository;
pub use service::{ProductService, DEFAULT_LOCALE};
