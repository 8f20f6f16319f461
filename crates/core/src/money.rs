//! Currency amount parsing and normalisation.
//!
//! Prices arrive from browser clients as either JSON numbers or strings.
//! Every amount is normalised to two-decimal currency precision before it
//! reaches the payment gateway or the ledger.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CoreError;

/// Number of fractional digits used for every stored or submitted amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Largest single order amount accepted (whole currency units).
pub const MAX_ORDER_AMOUNT: i64 = 100_000;

/// Parse a raw JSON value into a normalised, strictly positive amount.
///
/// Accepts numbers (`85`, `85.5`) and numeric strings (`"85.00"`). Anything
/// else is rejected with [`CoreError::Validation`].
pub fn parse_amount(raw: &serde_json::Value) -> Result<Decimal, CoreError> {
    let parsed = match raw {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };

    let amount = parsed
        .ok_or_else(|| CoreError::Validation("Invalid package price: not a number".into()))?;

    normalize_amount(amount)
}

/// Round to currency precision and enforce `0 < amount <= MAX_ORDER_AMOUNT`.
///
/// The positivity check runs after rounding so `0.004` is rejected rather
/// than submitted as `0.00`.
pub fn normalize_amount(amount: Decimal) -> Result<Decimal, CoreError> {
    let rounded = amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);

    if rounded <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "Invalid package price: must be greater than zero".into(),
        ));
    }
    if rounded > Decimal::from(MAX_ORDER_AMOUNT) {
        return Err(CoreError::Validation(format!(
            "Invalid package price: must not exceed {MAX_ORDER_AMOUNT}"
        )));
    }

    Ok(rounded)
}

/// Render an amount the way payment processors expect it (`"85.00"`).
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
