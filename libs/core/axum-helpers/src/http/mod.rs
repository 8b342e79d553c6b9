//! HTTP-level middleware shared by every router.

pub mod security;

pub use security::security_headers;
