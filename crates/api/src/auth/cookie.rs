//! Session cookie encoding and lookup.

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};

use super::jwt::JwtConfig;

/// Name of the cookie carrying the session JWT.
pub const SESSION_COOKIE: &str = "token";

/// `Set-Cookie` value that stores `token` for the configured lifetime.
pub fn session_cookie(token: &str, config: &JwtConfig) -> Option<HeaderValue> {
    build(token, config.expiry_secs(), config.cookie_secure)
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_cookie(config: &JwtConfig) -> Option<HeaderValue> {
    build("", 0, config.cookie_secure)
}

fn build(value: &str, max_age_secs: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Find a cookie value by name across every `Cookie` header.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
