//! Shared harness for API integration tests: test doubles for the external
//! services, the real router wired to them, and request helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tower::ServiceExt;

use studio_api::auth::jwt::JwtConfig;
use studio_api::auth::password::hash_password;
use studio_api::config::ServerConfig;
use studio_api::middleware::rate_limit::RateLimiter;
use studio_api::router::build_app_router;
use studio_api::state::AppState;
use studio_assistant::{ChatModel, ChatModelError, ModelTurn};
use studio_core::money::normalize_amount;
use studio_core::roles::{ROLE_ADMIN, ROLE_CLIENT};
use studio_db::models::user::{CreateUser, User};
use studio_db::repositories::UserRepo;
use studio_events::{EmailError, Mailer, NotificationDispatcher};
use studio_payments::{CaptureResult, CaptureStatus, Payer, PaymentError, PaymentGateway, PublicConfig};

/// Password used for every seeded test account.
pub const TEST_PASSWORD: &str = "Mixdown42";

/// Inbox configured to receive chat transcripts.
pub const STUDIO_INBOX: &str = "studio@example.com";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults and generous rate limits.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        studio_inbox: STUDIO_INBOX.to_string(),
        chat_rate_limit_per_min: 100,
        auth_rate_limit: 100,
        auth_rate_window_secs: 900,
        chat_session_ttl_hours: 24,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            expiry_hours: 24,
            cookie_secure: false,
        },
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Amount captured for orders a test never created through the API
/// (the "Big Leagues" package price).
pub const DEFAULT_CAPTURED_AMOUNT: &str = "85.00";

/// In-memory payment gateway that counts calls.
///
/// Captures report the amount the order was created with.
pub struct MockGateway {
    pub create_calls: AtomicUsize,
    pub capture_calls: AtomicUsize,
    capture_status: Mutex<String>,
    order_amounts: Mutex<HashMap<String, Decimal>>,
    fail_create: AtomicBool,
    fail_capture: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            create_calls: AtomicUsize::new(0),
            capture_calls: AtomicUsize::new(0),
            capture_status: Mutex::new("COMPLETED".to_string()),
            order_amounts: Mutex::new(HashMap::new()),
            fail_create: AtomicBool::new(false),
            fail_capture: AtomicBool::new(false),
        }
    }

    /// Status reported by subsequent captures.
    pub fn set_capture_status(&self, status: &str) {
        *self.capture_status.lock().unwrap() = status.to_string();
    }

    /// Make subsequent order creations fail at the transport level.
    pub fn fail_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    /// Make subsequent captures fail at the transport level.
    pub fn fail_captures(&self) {
        self.fail_capture.store(true, Ordering::SeqCst);
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn captures(&self) -> usize {
        self.capture_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, amount: Decimal) -> Result<String, PaymentError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let amount =
            normalize_amount(amount).map_err(|e| PaymentError::InvalidAmount(e.to_string()))?;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(PaymentError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let order_id = format!("ORDER-{n}");
        self.order_amounts
            .lock()
            .unwrap()
            .insert(order_id.clone(), amount);
        Ok(order_id)
    }

    async fn capture_order(&self, order_id: &str) -> Result<CaptureResult, PaymentError> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(PaymentError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let status = self.capture_status.lock().unwrap().clone();
        let amount = self
            .order_amounts
            .lock()
            .unwrap()
            .get(order_id)
            .copied()
            .unwrap_or_else(|| Decimal::from_str(DEFAULT_CAPTURED_AMOUNT).unwrap());
        Ok(CaptureResult {
            order_id: order_id.to_string(),
            status: CaptureStatus::parse(&status),
            payer: Payer {
                payer_id: Some("PAYER123".to_string()),
                email: Some("payer@example.com".to_string()),
                name: Some("Pat Payer".to_string()),
            },
            captured_amount: Some(amount),
            raw: serde_json::json!({ "id": order_id, "status": status }),
        })
    }

    fn public_config(&self) -> PublicConfig {
        PublicConfig {
            client_id: "test-client-id".to_string(),
            currency: "USD".to_string(),
            mode: "sandbox".to_string(),
        }
    }
}

/// One captured outbound email.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that records every message instead of sending it.
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until at least `count` emails were sent (or two seconds pass),
    /// then return everything sent so far.
    pub async fn wait_for(&self, count: usize) -> Vec<SentEmail> {
        for _ in 0..200 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // Give stray deliveries a moment to show up.
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailError::Build("simulated failure".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Chat model that echoes the message and records the history it saw.
pub struct FakeChatModel {
    pub history_lens: Mutex<Vec<usize>>,
    fail_quota: AtomicBool,
}

impl FakeChatModel {
    pub fn new() -> Self {
        Self {
            history_lens: Mutex::new(Vec::new()),
            fail_quota: AtomicBool::new(false),
        }
    }

    pub fn exhaust_quota(&self) {
        self.fail_quota.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn generate(
        &self,
        _system: &str,
        history: &[ModelTurn],
        message: &str,
    ) -> Result<String, ChatModelError> {
        if self.fail_quota.load(Ordering::SeqCst) {
            return Err(ChatModelError::Api {
                status: 429,
                body: "RESOURCE_EXHAUSTED".to_string(),
            });
        }
        self.history_lens.lock().unwrap().push(history.len());
        Ok(format!("Echo: {message}"))
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The real router wired to in-memory test doubles.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub gateway: Arc<MockGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub model: Arc<FakeChatModel>,
}

impl TestApp {
    /// A fresh router for one request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, test_config())
}

/// Build the full application router (same middleware stack as `main.rs`).
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> TestApp {
    let gateway = Arc::new(MockGateway::new());
    let mailer = Arc::new(RecordingMailer::new());
    let model = Arc::new(FakeChatModel::new());

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        payments: gateway.clone(),
        notifier: NotificationDispatcher::new(mailer.clone()),
        chat_model: model.clone(),
        chat_limiter: Arc::new(RateLimiter::new(
            config.chat_rate_limit_per_min,
            Duration::from_secs(60),
        )),
        auth_limiter: Arc::new(RateLimiter::new(
            config.auth_rate_limit,
            Duration::from_secs(config.auth_rate_window_secs),
        )),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        gateway,
        mailer,
        model,
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Insert an account directly (bypassing signup) with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    let input = CreateUser {
        email: email.to_string(),
        name: Some("Test Artist".to_string()),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role: role.to_string(),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

pub async fn create_client(pool: &PgPool, email: &str) -> User {
    create_user(pool, email, ROLE_CLIENT).await
}

pub async fn create_admin(pool: &PgPool, email: &str) -> User {
    create_user(pool, email, ROLE_ADMIN).await
}

/// Log in through the API and return the `Cookie` header value.
pub async fn login(app: Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK, "login should succeed");
    session_cookie(&response).expect("login must set the session cookie")
}

/// Extract `token=...` from a `Set-Cookie` response header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_with_cookie(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(cookie), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_with_cookie(
    app: Router,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(cookie), Some(body)).await
}

pub async fn put_json_with_cookie(
    app: Router,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(cookie), Some(body)).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
