//! # Axum Helpers
//!
//! Shared building blocks for the workspace's Axum services.
//!
//! ## Modules
//!
//! - **[`auth`]**: stateless JWT identity and the [`Caller`] extractor
//! - **[`rate_limit`]**: per-connection throttling backed by `governor`
//! - **[`server`]**: router assembly, health checks, graceful shutdown
//! - **[`http`]**: security headers
//! - **[`errors`]**: structured error responses with error codes

pub mod auth;
pub mod errors;
pub mod http;
pub mod rate_limit;
pub mod server;

pub use auth::{Caller, JwtAuth, JwtClaims, JwtConfig, optional_jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, cors_layer_from_env,
    create_production_app, create_router, health_router, run_health_checks,
};

pub use http::security_headers;

pub use errors::{AppError, DomainError, ErrorCode, ErrorResponse};

pub use rate_limit::{ConnectionRateLimiter, RateLimitConfig, rate_limit_middleware};
