use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Mailbox that receives finished chat transcripts.
    pub studio_inbox: String,
    /// Chat messages allowed per client per minute.
    pub chat_rate_limit_per_min: u32,
    /// Auth attempts allowed per client per window.
    pub auth_rate_limit: u32,
    /// Length of the auth rate-limit window in seconds.
    pub auth_rate_window_secs: u64,
    /// Idle lifetime of a chat conversation in hours.
    pub chat_session_ttl_hours: i64,
    /// JWT token and cookie configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `STUDIO_INBOX`            | `productions@tysunmike.us` |
    /// | `CHAT_RATE_LIMIT_PER_MIN` | `20`                       |
    /// | `AUTH_RATE_LIMIT`         | `5`                        |
    /// | `AUTH_RATE_WINDOW_SECS`   | `900`                      |
    /// | `CHAT_SESSION_TTL_HOURS`  | `24`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let studio_inbox =
            std::env::var("STUDIO_INBOX").unwrap_or_else(|_| "productions@tysunmike.us".into());

        let chat_rate_limit_per_min: u32 = std::env::var("CHAT_RATE_LIMIT_PER_MIN")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("CHAT_RATE_LIMIT_PER_MIN must be a valid u32");

        let auth_rate_limit: u32 = std::env::var("AUTH_RATE_LIMIT")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("AUTH_RATE_LIMIT must be a valid u32");

        let auth_rate_window_secs: u64 = std::env::var("AUTH_RATE_WINDOW_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("AUTH_RATE_WINDOW_SECS must be a valid u64");

        let chat_session_ttl_hours: i64 = std::env::var("CHAT_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .expect("CHAT_SESSION_TTL_HOURS must be a valid i64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            studio_inbox,
            chat_rate_limit_per_min,
            auth_rate_limit,
            auth_rate_window_secs,
            chat_session_ttl_hours,
            jwt,
        }
    }
}
