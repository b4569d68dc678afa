//! Conversion of exchange text into canonical values.
//!
//! Exchanges send numbers as strings (sometimes as JSON numbers, sometimes
//! in scientific notation). Everything here is all-or-nothing: one bad
//! entry fails the whole conversion, so callers never see a partial book.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::PriceLevel;
use crate::error::ExchangeError;

/// Maximum number of decimal places a [`Decimal`] can carry.
const MAX_SCALE: u32 = 28;

/// Parse exchange number text, accepting plain and scientific notation.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// [`parse_decimal`] with an error naming the exchange and field.
pub fn number(exchange: &'static str, field: &'static str, text: &str) -> Result<Decimal, ExchangeError> {
    parse_decimal(text).ok_or_else(|| ExchangeError::InvalidNumber {
        exchange,
        field,
        value: text.to_string(),
    })
}

/// Text of a JSON string or number; `None` for anything else.
#[must_use]
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `10^-places`, the step size for a precision given as a decimal count.
#[must_use]
pub fn step_from_decimals(places: u32) -> Decimal {
    Decimal::new(1, places.min(MAX_SCALE))
}

/// Deserialize a response body, mapping failure to [`ExchangeError::Malformed`].
pub fn decode<T: DeserializeOwned>(
    exchange: &'static str,
    operation: &'static str,
    body: &str,
) -> Result<T, ExchangeError> {
    serde_json::from_str(body).map_err(|e| ExchangeError::Malformed {
        exchange,
        operation,
        reason: format!("{e}: {}", excerpt(body)),
    })
}

/// First part of a body, for error messages.
#[must_use]
pub fn excerpt(body: &str) -> String {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// One `[price, quantity, ...]` entry as exchanges send it.
///
/// Elements may be strings or JSON numbers; trailing elements (timestamps,
/// order counts) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawLevel(Vec<Value>);

impl RawLevel {
    fn text(&self, index: usize) -> Option<String> {
        value_text(self.0.get(index)?)
    }

    /// Parse into a canonical level.
    pub fn to_level(&self, exchange: &'static str) -> Result<PriceLevel, ExchangeError> {
        let rate = self.text(0).unwrap_or_default();
        let quantity = self.text(1).unwrap_or_default();
        Ok(PriceLevel::new(
            number(exchange, "rate", &rate)?,
            number(exchange, "quantity", &quantity)?,
        ))
    }
}

/// The common `{"bids": [[p, q], ...], "asks": [[p, q], ...]}` shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawBook {
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    #[serde(default)]
    pub asks: Vec<RawLevel>,
}

impl RawBook {
    /// Parse both sides, failing on the first malformed entry.
    pub fn to_levels(
        &self,
        exchange: &'static str,
    ) -> Result<(Vec<PriceLevel>, Vec<PriceLevel>), ExchangeError> {
        Ok((
            raw_levels(exchange, &self.bids)?,
            raw_levels(exchange, &self.asks)?,
        ))
    }
}

/// Parse a list of raw entries.
pub fn raw_levels(exchange: &'static str, raw: &[RawLevel]) -> Result<Vec<PriceLevel>, ExchangeError> {
    raw.iter().map(|level| level.to_level(exchange)).collect()
}

/// Parse `(rate, quantity)` text pairs.
pub fn text_levels<'a, I>(exchange: &'static str, entries: I) -> Result<Vec<PriceLevel>, ExchangeError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    entries
        .into_iter()
        .map(|(rate, quantity)| {
            Ok(PriceLevel::new(
                number(exchange, "rate", rate)?,
                number(exchange, "quantity", quantity)?,
            ))
        })
        .collect()
}
