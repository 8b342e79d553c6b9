//! Application state management

use axum_helpers::{ConnectionRateLimiter, JwtAuth};
use domain_products::{MongoProductRepository, ProductService};
use mongodb::{Client, Database};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub mongo_client: Client,
    pub db: Database,
    pub products: ProductService<MongoProductRepository>,
    pub limiter: ConnectionRateLimiter,
    pub jwt: JwtAuth,
}
