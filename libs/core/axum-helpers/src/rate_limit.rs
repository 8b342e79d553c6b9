//! Per-connection call throttling.
//!
//! A keyed GCRA limiter from `governor`: each connection gets a burst of
//! `calls` and regains one call per `window`, so no window admits more than
//! `calls` plus the one call freed at its edge. Connections are keyed by the
//! peer socket address the server accepted; nothing the client sends can
//! change its key.
//!
//! ```ignore
//! let limiter = ConnectionRateLimiter::new(&RateLimitConfig::from_env_prefixed("PRODUCTS")?)?;
//! let commands = Router::new()
//!     .route("/insert", post(insert))
//!     .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
//! ```
//!
//! The server must be started with
//! `into_make_service_with_connect_info::<SocketAddr>()`.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use core_config::{ConfigError, env_parse};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use tokio::task::JoinHandle;

use crate::errors::{AppError, DomainError, ErrorCode};

pub const RATE_LIMITED_REASON: &str = "too-many-requests";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Calls allowed per window
    pub calls: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(calls: u32, window: Duration) -> Self {
        Self { calls, window }
    }

    /// Reads `{PREFIX}_RATE_LIMIT_CALLS` (default 5) and
    /// `{PREFIX}_RATE_LIMIT_WINDOW_MS` (default 1000).
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        let calls_key = format!("{prefix}_RATE_LIMIT_CALLS");
        let window_key = format!("{prefix}_RATE_LIMIT_WINDOW_MS");

        let calls = env_parse(&calls_key, 5u32)?;
        let window_ms = env_parse(&window_key, 1000u64)?;

        if calls == 0 {
            return Err(ConfigError::ParseError {
                key: calls_key,
                details: "must be at least 1".to_string(),
            });
        }
        if window_ms == 0 {
            return Err(ConfigError::ParseError {
                key: window_key,
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self::new(calls, Duration::from_millis(window_ms)))
    }

    fn quota(&self) -> Option<Quota> {
        let burst = NonZeroU32::new(self.calls)?;
        Quota::with_period(self.window).map(|q| q.allow_burst(burst))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(1000))
    }
}

/// Shared keyed limiter; cloning shares the underlying state.
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<SocketAddr>>,
    clock: DefaultClock,
}

impl ConnectionRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Result<Self, ConfigError> {
        let quota = config.quota().ok_or_else(|| ConfigError::ParseError {
            key: "RATE_LIMIT".to_string(),
            details: format!("cannot build a quota from {config:?}"),
        })?;

        tracing::info!(calls = config.calls, window = ?config.window, "Rate limiter configured");

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
        })
    }

    /// Consumes one call for `peer`, or reports how long until one frees up.
    pub fn check(&self, peer: &SocketAddr) -> Result<(), AppError> {
        self.limiter.check_key(peer).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            let message = format!("Rate limit exceeded. Retry in {}ms.", wait.as_millis().max(1));

            AppError::from(
                DomainError::new(ErrorCode::TooManyRequests, RATE_LIMITED_REASON, message)
                    .with_details(serde_json::json!({ "retryAfterMs": wait.as_millis() as u64 })),
            )
        })
    }

    /// Number of connections currently tracked.
    pub fn tracked_connections(&self) -> usize {
        self.limiter.len()
    }

    /// Drops state for connections whose budget has fully recovered.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Periodically calls [`Self::retain_recent`] so idle keys don't accumulate.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                this.retain_recent();
                tracing::trace!(tracked = this.tracked_connections(), "Rate limiter swept");
            }
        })
    }
}

/// Rejects the request with 429 before it reaches the handler when the
/// connection is over budget.
///
/// A request without a peer address cannot be attributed to a connection
/// and is refused with 500.
pub async fn rate_limit_middleware(
    State(limiter): State<ConnectionRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let peer = match ConnectInfo::<SocketAddr>::from_request_parts(&mut parts, &()).await {
        Ok(ConnectInfo(peer)) => peer,
        Err(_) => {
            tracing::warn!(
                path = %parts.uri.path(),
                "No peer address on request; serve with connect info to enable throttling"
            );
            return AppError::InternalServerError("Peer address unavailable".to_string())
                .into_response();
        }
    };

    if let Err(e) = limiter.check(&peer) {
        tracing::debug!(%peer, path = %parts.uri.path(), "Call rejected by rate limiter");
        return e.into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}
