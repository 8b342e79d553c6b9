//! API routes module

pub mod health;
pub mod products;

use axum::{middleware, Router};
use axum_helpers::optional_jwt_auth_middleware;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/products", products::router(state))
        .merge(health::router(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            optional_jwt_auth_middleware,
        ))
}

/// Prepare the store: indexes and the initial public product
pub async fn init(state: &AppState) -> eyre::Result<()> {
    products::init_indexes(state).await?;
    products::seed(state).await
}
