//! Decimal arithmetic for prices and amounts.
//!
//! Monetary quantities never pass through binary floating point. Values are
//! either [`Decimal`] or decimal strings; the string helpers accept anything
//! [`parse_decimal`] understands and render results without trailing zeros.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a decimal string, accepting plain and scientific notation.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

/// Render a decimal without insignificant trailing zeros.
pub fn to_string(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn add(a: &str, b: &str) -> Option<String> {
    let sum = parse_decimal(a)?.checked_add(parse_decimal(b)?)?;
    Some(to_string(sum))
}

pub fn sub(a: &str, b: &str) -> Option<String> {
    let diff = parse_decimal(a)?.checked_sub(parse_decimal(b)?)?;
    Some(to_string(diff))
}

pub fn mul(a: &str, b: &str) -> Option<String> {
    let product = parse_decimal(a)?.checked_mul(parse_decimal(b)?)?;
    Some(to_string(product))
}

pub fn abs(a: &str) -> Option<String> {
    Some(to_string(parse_decimal(a)?.abs()))
}

/// `a < b`, or `None` when either side is not a decimal.
pub fn less_than(a: &str, b: &str) -> Option<bool> {
    Some(parse_decimal(a)? < parse_decimal(b)?)
}

/// Sum of two optional decimals; absent when either operand is absent.
pub fn opt_add(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_add(b?)
}

pub fn opt_sub(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_sub(b?)
}

pub fn opt_mul(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    a?.checked_mul(b?)
}

/// Number of fractional digits a decimal was reported with.
pub fn scale_of(value: Decimal) -> u32 {
    value.scale()
}

/// Truncate toward zero to `places` fractional digits (order amounts).
pub fn truncate_to_places(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::ToZero)
}

/// Round half away from zero to `places` fractional digits (prices).
pub fn round_to_places(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Fractional digits implied by a tick size such as `0.001`.
pub fn places_from_tick(tick: Decimal) -> Option<u32> {
    (tick > Decimal::ZERO).then(|| tick.normalize().scale())
}

/// Volume-weighted average price from 24h volumes.
///
/// This is the one derivation where a division is unavoidable; a zero base
/// volume yields `None` rather than an error.
pub fn vwap(base_volume: Option<Decimal>, quote_volume: Option<Decimal>) -> Option<Decimal> {
    let base = base_volume?;
    if base.is_zero() {
        return None;
    }
    quote_volume?.checked_div(base)
}
