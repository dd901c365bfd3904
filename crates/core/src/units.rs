//! Conversion between raw token amounts and human-readable decimal strings.

use alloy::primitives::{
    U256,
    utils::{ParseUnits, format_units, parse_units},
};
use serde::Serializer;

use crate::AppError;

/// Format `raw / 10^decimals` as a decimal string.
///
/// Trailing fractional zeros are trimmed but at least one fractional digit is
/// kept, so `1000 * 10^18` at 18 decimals renders as `"1000.0"`.
///
/// Any `uint8` decimals value a contract reports is accepted.
pub fn format_amount(raw: U256, decimals: u8) -> String {
    let full = format_units(raw, decimals).unwrap_or_else(|_| shift_point(raw, decimals));
    canonicalize(full)
}

/// Place the decimal point `decimals` digits from the right of `raw`.
///
/// Covers the exponents alloy's unit table stops short of.
fn shift_point(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let decimals = usize::from(decimals);
    if digits.len() > decimals {
        let (int, frac) = digits.split_at(digits.len() - decimals);
        format!("{int}.{frac}")
    } else {
        format!("0.{digits:0>decimals$}")
    }
}

fn canonicalize(mut s: String) -> String {
    if let Some(dot) = s.find('.') {
        let significant = s.trim_end_matches('0').len();
        s.truncate(significant);
        if s.len() == dot + 1 {
            s.push('0');
        }
    } else {
        s.push_str(".0");
    }
    s
}

/// Parse a human decimal string into a raw amount at `decimals` precision.
///
/// Negative amounts and amounts with more fractional digits than `decimals`
/// are rejected.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, AppError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidAmount("amount is empty".into()));
    }
    if trimmed.starts_with('-') {
        return Err(AppError::InvalidAmount(format!("`{trimmed}` is negative")));
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.trim_end_matches('0').len() > decimals as usize {
            return Err(AppError::InvalidAmount(format!(
                "`{trimmed}` has more than {decimals} fractional digits"
            )));
        }
    }

    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(raw)) => Ok(raw),
        Ok(ParseUnits::I256(_)) => Err(AppError::InvalidAmount(format!("`{trimmed}` is negative"))),
        Err(e) => Err(AppError::InvalidAmount(format!("`{trimmed}`: {e}"))),
    }
}

/// Serialize a [`U256`] as a base-10 string instead of alloy's hex form.
pub fn serialize_decimal<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}
