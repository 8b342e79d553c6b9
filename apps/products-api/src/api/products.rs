//! Products API routes

use axum::Router;
use domain_products::{handlers, naming, DEFAULT_LOCALE};

use crate::state::AppState;

/// Create products router
pub fn router(state: &AppState) -> Router {
    handlers::router(state.products.clone(), state.limiter.clone())
}

/// Initialize products indexes
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    state.products.repository().init_indexes().await?;
    Ok(())
}

/// Make sure at least one public product exists
pub async fn seed(state: &AppState) -> eyre::Result<()> {
    let base = naming::base_label(&state.config.products.default_locale, DEFAULT_LOCALE);
    let name = naming::candidate(base, 0);

    match state.products.ensure_public_product(&name).await? {
        Some(id) => tracing::info!(product_id = %id, %name, "No public product found, seeded one"),
        None => tracing::debug!("Public product present, nothing to seed"),
    }
    Ok(())
}
