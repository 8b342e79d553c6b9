//! Server infrastructure: router assembly with API docs, liveness and
//! readiness helpers, and coordinated graceful shutdown.
//!
//! ```ignore
//! let router = create_router::<ApiDoc>(api_routes, cors_layer_from_env()?)
//!     .merge(health_router(app_info!()));
//! create_production_app(router, &server_config, ShutdownCoordinator::new(), cleanup).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{cors_layer_from_env, create_production_app, create_router};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::ShutdownCoordinator;
