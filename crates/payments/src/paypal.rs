//! PayPal Orders v2 REST client.
//!
//! Authenticates with the client-credentials grant, caches the access token
//! until shortly before it expires, and maps the create/capture endpoints
//! onto [`PaymentGateway`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::Mutex;

use studio_core::money::{format_amount, normalize_amount};

use crate::{CaptureResult, CaptureStatus, Payer, PaymentError, PaymentGateway, PublicConfig};

const SANDBOX_API_BASE: &str = "https://api-m.sandbox.paypal.com";
const LIVE_API_BASE: &str = "https://api-m.paypal.com";

/// Default ISO 4217 currency for orders.
const DEFAULT_CURRENCY: &str = "USD";

/// Refresh the access token this long before PayPal says it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Per-request timeout for calls to PayPal.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Which PayPal environment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayPalMode {
    Sandbox,
    Live,
}

impl PayPalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Live => "live",
        }
    }

    fn api_base(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_API_BASE,
            Self::Live => LIVE_API_BASE,
        }
    }
}

/// Configuration for the PayPal client.
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub mode: PayPalMode,
    pub currency: String,
    /// REST base URL. Derived from `mode` unless overridden.
    pub api_base: String,
}

impl PayPalConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if either credential is missing, signalling that
    /// payments are not configured.
    ///
    /// | Variable               | Required | Default                |
    /// |------------------------|----------|------------------------|
    /// | `PAYPAL_CLIENT_ID`     | yes      | --                      |
    /// | `PAYPAL_CLIENT_SECRET` | yes      | --                      |
    /// | `PAYPAL_MODE`          | no       | `sandbox`              |
    /// | `PAYPAL_CURRENCY`      | no       | `USD`                  |
    /// | `PAYPAL_API_BASE`      | no       | derived from the mode  |
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("PAYPAL_CLIENT_ID").ok()?;
        let client_secret = std::env::var("PAYPAL_CLIENT_SECRET").ok()?;

        let mode = match std::env::var("PAYPAL_MODE").as_deref() {
            Ok("live") => PayPalMode::Live,
            _ => PayPalMode::Sandbox,
        };

        Some(Self {
            client_id,
            client_secret,
            mode,
            currency: std::env::var("PAYPAL_CURRENCY")
                .unwrap_or_else(|_| DEFAULT_CURRENCY.to_string()),
            api_base: std::env::var("PAYPAL_API_BASE")
                .unwrap_or_else(|_| mode.api_base().to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    id: String,
    status: String,
    #[serde(default)]
    payer: Option<PayerPayload>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnitPayload>,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnitPayload {
    #[serde(default)]
    payments: Option<PaymentsPayload>,
}

#[derive(Debug, Deserialize)]
struct PaymentsPayload {
    #[serde(default)]
    captures: Vec<CapturePayload>,
}

#[derive(Debug, Deserialize)]
struct CapturePayload {
    amount: Option<AmountPayload>,
}

#[derive(Debug, Deserialize)]
struct AmountPayload {
    value: Decimal,
}

#[derive(Debug, Deserialize)]
struct PayerPayload {
    payer_id: Option<String>,
    email_address: Option<String>,
    name: Option<PayerName>,
}

#[derive(Debug, Deserialize)]
struct PayerName {
    given_name: Option<String>,
    surname: Option<String>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the PayPal REST API.
pub struct PayPalGateway {
    client: reqwest::Client,
    config: PayPalConfig,
    token: Mutex<Option<CachedToken>>,
}

impl PayPalGateway {
    pub fn new(config: PayPalConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a gateway reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: PayPalConfig) -> Self {
        Self {
            client,
            config,
            token: Mutex::new(None),
        }
    }

    /// Return a valid access token, fetching a new one if the cached token
    /// is missing or about to expire.
    async fn access_token(&self) -> Result<String, PaymentError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.config.api_base))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body("grant_type=client_credentials")
            .send()
            .await?;
        let token: TokenResponse = Self::parse_response(response).await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        tracing::debug!(expires_in = token.expires_in, "PayPal access token refreshed");

        Ok(token.access_token)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or return a
    /// [`PaymentError::Api`] containing the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn create_order(&self, amount: Decimal) -> Result<String, PaymentError> {
        let amount =
            normalize_amount(amount).map_err(|e| PaymentError::InvalidAmount(e.to_string()))?;

        let body = order_request(&self.config.currency, amount);
        let token = self.access_token().await?;
        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.config.api_base))
            .bearer_auth(token)
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        let order: CreateOrderResponse = Self::parse_response(response).await?;
        if order.id.trim().is_empty() {
            return Err(PaymentError::InvalidResponse("order id missing".into()));
        }

        tracing::info!(order_id = %order.id, amount = %format_amount(amount), "PayPal order created");
        Ok(order.id)
    }

    async fn capture_order(&self, order_id: &str) -> Result<CaptureResult, PaymentError> {
        let token = self.access_token().await?;
        // The request id makes a retried capture return the original result
        // instead of failing with ORDER_ALREADY_CAPTURED.
        let response = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{order_id}/capture",
                self.config.api_base
            ))
            .bearer_auth(token)
            .header("PayPal-Request-Id", format!("capture-{order_id}"))
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let raw: serde_json::Value = Self::parse_response(response).await?;
        let result = capture_result(raw)?;

        tracing::info!(
            order_id = %result.order_id,
            status = result.status.as_str(),
            amount = ?result.captured_amount,
            "PayPal capture returned",
        );
        Ok(result)
    }

    fn public_config(&self) -> PublicConfig {
        PublicConfig {
            client_id: self.config.client_id.clone(),
            currency: self.config.currency.clone(),
            mode: self.config.mode.as_str().to_string(),
        }
    }
}

fn order_request(currency: &str, amount: Decimal) -> serde_json::Value {
    serde_json::json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "amount": {
                "currency_code": currency,
                "value": format_amount(amount),
            }
        }]
    })
}

/// Validate a capture payload and lift out the fields the purchase flow
/// acts on.
fn capture_result(raw: serde_json::Value) -> Result<CaptureResult, PaymentError> {
    let parsed: CaptureResponse = serde_json::from_value(raw.clone())
        .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

    let payer = parsed
        .payer
        .map(|p| Payer {
            payer_id: p.payer_id,
            email: p.email_address,
            name: p.name.and_then(|n| {
                let full = [n.given_name, n.surname]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                (!full.is_empty()).then_some(full)
            }),
        })
        .unwrap_or_default();

    // One purchase unit with one capture per order.
    let captured_amount = parsed
        .purchase_units
        .into_iter()
        .next()
        .and_then(|unit| unit.payments)
        .and_then(|payments| payments.captures.into_iter().next())
        .and_then(|capture| capture.amount)
        .map(|amount| amount.value);

    Ok(CaptureResult {
        order_id: parsed.id,
        status: CaptureStatus::parse(&parsed.status),
        payer,
        captured_amount,
        raw,
    })
}
