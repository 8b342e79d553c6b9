//! Products API - REST server with live views

use std::time::Duration;

use axum_helpers::{
    cors_layer_from_env, create_production_app, create_router, health_router,
    ConnectionRateLimiter, JwtAuth, ShutdownCoordinator,
};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{ChangeFeed, MongoProductRepository, ProductService};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

/// How often idle connections are dropped from the rate limiter
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

    let mongo_client = database::mongodb::connect_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());

    let health = database::mongodb::check_health_detailed(&db).await;
    info!(
        response_time_ms = health.response_time_ms,
        "Successfully connected to MongoDB database: {}",
        config.mongodb.database()
    );

    let products = ProductService::new(MongoProductRepository::new(&db))
        .with_feed(ChangeFeed::new(config.products.feed_capacity))
        .with_default_locale(config.products.default_locale.clone());

    let limiter = ConnectionRateLimiter::new(&config.products.rate_limit)?;
    let sweeper = limiter.spawn_sweeper(LIMITER_SWEEP_INTERVAL);

    let state = AppState {
        jwt: JwtAuth::new(&config.jwt),
        config,
        mongo_client,
        db,
        products,
        limiter,
    };

    api::init(&state).await?;

    let api_routes = api::routes(&state);
    let router = create_router::<openapi::ApiDoc>(api_routes, cors_layer_from_env()?);
    let app = router.merge(health_router(state.config.app));

    info!(
        "Starting {} v{} on port {}",
        state.config.app.name, state.config.app.version, state.config.server.port
    );

    let feed = state.products.feed().clone();
    let mongo_client = state.mongo_client.clone();

    create_production_app(
        app,
        &state.config.server,
        ShutdownCoordinator::new(),
        async move {
            info!("Shutting down: closing live views");
            feed.close();
            sweeper.abort();

            info!("Shutting down: closing MongoDB connections");
            mongo_client.shutdown().await;
            info!("MongoDB connection closed");
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
