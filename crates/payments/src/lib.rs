//! Payment gateway adapter.
//!
//! [`PaymentGateway`] is the two-phase contract the purchase flow depends
//! on: create an order for a normalised amount, then capture it once the
//! buyer has approved it with the processor. [`PayPalGateway`] implements
//! it against the PayPal Orders v2 REST API.

pub mod paypal;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

pub use paypal::{PayPalConfig, PayPalGateway, PayPalMode};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the payment gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The amount failed validation before any external call was made.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The processor returned a non-2xx status code.
    #[error("Payment processor error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The processor answered 2xx but the payload was not usable.
    #[error("Unexpected payment processor response: {0}")]
    InvalidResponse(String),

    /// No processor credentials are configured.
    #[error("Payment processing is not configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// Capture result
// ---------------------------------------------------------------------------

/// Order status as reported by the processor after a capture attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum CaptureStatus {
    Completed,
    Other(String),
}

impl CaptureStatus {
    /// Parse the processor's status string. Only an exact `COMPLETED`
    /// counts as success.
    pub fn parse(raw: &str) -> Self {
        if raw == "COMPLETED" {
            Self::Completed
        } else {
            Self::Other(raw.to_string())
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Other(s) => s,
        }
    }
}

impl From<CaptureStatus> for String {
    fn from(status: CaptureStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Identity of the buyer as reported by the processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Payer {
    pub payer_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Outcome of a capture call.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureResult {
    pub order_id: String,
    pub status: CaptureStatus,
    pub payer: Payer,
    /// Amount the processor actually captured. Absent when the payload
    /// carries no capture record.
    pub captured_amount: Option<Decimal>,
    /// Untouched processor payload, kept for support investigations.
    pub raw: serde_json::Value,
}

/// Identifiers safe to hand to the browser checkout widget.
#[derive(Debug, Clone, Serialize)]
pub struct PublicConfig {
    pub client_id: String,
    pub currency: String,
    pub mode: String,
}

// ---------------------------------------------------------------------------
// PaymentGateway
// ---------------------------------------------------------------------------

/// External payment processor capability.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a pending order. Implementations normalise `amount` to
    /// currency precision and reject non-positive values without making a
    /// network call.
    async fn create_order(&self, amount: Decimal) -> Result<String, PaymentError>;

    /// Capture a buyer-approved order. Safe to retry for the same order id.
    async fn capture_order(&self, order_id: &str) -> Result<CaptureResult, PaymentError>;

    /// Public, non-secret identifiers for the client checkout.
    fn public_config(&self) -> PublicConfig;
}

/// Gateway used when no processor credentials are configured. Every call
/// fails with [`PaymentError::NotConfigured`].
#[derive(Debug, Clone)]
pub struct DisabledGateway {
    currency: String,
}

impl DisabledGateway {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_order(&self, amount: Decimal) -> Result<String, PaymentError> {
        studio_core::money::normalize_amount(amount)
            .map_err(|e| PaymentError::InvalidAmount(e.to_string()))?;
        Err(PaymentError::NotConfigured)
    }

    async fn capture_order(&self, _order_id: &str) -> Result<CaptureResult, PaymentError> {
        Err(PaymentError::NotConfigured)
    }

    fn public_config(&self) -> PublicConfig {
        PublicConfig {
            client_id: String::new(),
            currency: self.currency.clone(),
            mode: "disabled".to_string(),
        }
    }
}
