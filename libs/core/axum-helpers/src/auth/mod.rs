//! Caller identity.
//!
//! Tokens are stateless HS256 JWTs whose `sub` claim is the user id. The
//! middlewares decode them into [`JwtClaims`] request extensions and the
//! [`Caller`] extractor turns those into an optional user id.
//!
//! ```ignore
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let app = Router::new()
//!     .route("/api/products/private", get(handler))
//!     .layer(axum::middleware::from_fn_with_state(auth, optional_jwt_auth_middleware));
//! ```

pub mod caller;
pub mod config;
pub mod jwt;
pub mod middleware;

pub use caller::Caller;
pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims};
pub use middleware::optional_jwt_auth_middleware;
