//! Request extractors and guards.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from the session cookie.
//! - [`auth::MaybeAuthUser`] -- Same, but anonymous requests pass through.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`client_key::ClientKey`] -- Identifies the caller for rate limiting.
//! - [`rate_limit::RateLimiter`] -- Fixed-window per-client request limiter.

pub mod auth;
pub mod client_key;
pub mod rate_limit;
pub mod rbac;
