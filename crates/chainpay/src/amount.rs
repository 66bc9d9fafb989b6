//! Exact conversion between human decimal strings and smallest-unit integers
//!
//! All arithmetic happens on [`U256`] smallest units. Decimal strings are
//! parsed without floats or exponent notation. Fractional digits beyond the
//! asset's precision are accepted only when they are zeros.

use alloy::primitives::U256;
use chainpay_error::{ChainpayError, Result};
use serde::Serialize;
use std::fmt;

/// Largest precision any supported asset uses
pub const MAX_DECIMALS: u8 = 18;

fn invalid(amount: &str, reason: impl Into<String>) -> ChainpayError {
    ChainpayError::InvalidAmount {
        amount: amount.to_string(),
        reason: reason.into(),
    }
}

/// Parses a non-negative decimal string into smallest units
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(invalid(amount, "empty amount"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid(amount, "amount must be positive"));
    }
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let (whole, frac) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid(amount, "no digits"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(amount, "not a plain decimal number"));
    }

    let precision = decimals as usize;
    let (kept, excess) = if frac.len() > precision {
        frac.split_at(precision)
    } else {
        (frac, "")
    };
    if excess.bytes().any(|b| b != b'0') {
        return Err(invalid(
            amount,
            format!("more than {decimals} decimal places"),
        ));
    }

    let mut digits = String::with_capacity(whole.len() + precision);
    digits.push_str(whole);
    digits.push_str(kept);
    digits.extend(std::iter::repeat('0').take(precision - kept.len()));
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 10).map_err(|_| invalid(amount, "amount too large"))
}

/// Parses an amount that must be strictly positive
pub fn parse_positive(amount: &str, decimals: u8) -> Result<U256> {
    let raw = parse_units(amount, decimals)?;
    if raw.is_zero() {
        return Err(invalid(amount, "amount must be greater than zero"));
    }
    Ok(raw)
}

/// Formats smallest units as an exact decimal string without trailing zeros
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let precision = decimals as usize;
    if precision == 0 {
        return digits;
    }

    let padded = if digits.len() <= precision {
        format!("{}{}", "0".repeat(precision + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, frac) = padded.split_at(padded.len() - precision);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

/// Rescales `raw` at `decimals` to [`MAX_DECIMALS`] for cross-asset comparison
pub fn normalize(raw: U256, decimals: u8) -> Option<U256> {
    let shift = MAX_DECIMALS.checked_sub(decimals)?;
    raw.checked_mul(U256::from(10u64).pow(U256::from(shift)))
}

/// An exact amount of some asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    raw: U256,
    decimals: u8,
}

impl Amount {
    /// Wraps smallest units
    pub fn from_raw(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Parses a human decimal string
    pub fn parse(amount: &str, decimals: u8) -> Result<Self> {
        Ok(Self::from_raw(parse_units(amount, decimals)?, decimals))
    }

    /// Smallest units
    pub fn raw(&self) -> U256 {
        self.raw
    }

    /// Decimal places
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Exact human-readable value
    pub fn human(&self) -> String {
        format_units(self.raw, self.decimals)
    }

    /// Checked addition of same-precision amounts
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        if self.decimals != other.decimals {
            return None;
        }
        self.raw
            .checked_add(other.raw)
            .map(|raw| Amount::from_raw(raw, self.decimals))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.human())
    }
}

/// Wire form of an amount: raw integer, precision and exact decimal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountView {
    /// Smallest units as a base-10 string
    pub raw_amount: String,
    /// Decimal places
    pub decimals: u8,
    /// Exact human-readable value
    pub human_amount: String,
}

impl From<Amount> for AmountView {
    fn from(amount: Amount) -> Self {
        Self {
            raw_amount: amount.raw.to_string(),
            decimals: amount.decimals,
            human_amount: amount.human(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(parse_units("1", 18).unwrap(), U256::from(10u64).pow(U256::from(18)));
        assert_eq!(parse_units("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_units(".25", 2).unwrap(), U256::from(25u64));
        assert_eq!(parse_units("7.", 2).unwrap(), U256::from(700u64));
        assert_eq!(parse_units("0.000001", 6).unwrap(), U256::from(1u64));
        assert_eq!(parse_units("0", 18).unwrap(), U256::ZERO);
        assert_eq!(parse_units("42", 0).unwrap(), U256::from(42u64));
    }

    #[test]
    fn test_trailing_zeros_beyond_precision() {
        assert_eq!(parse_units("1.500000000", 6).unwrap(), U256::from(1_500_000u64));
        assert!(parse_units("1.0000001", 6).is_err());
    }

    #[test]
    fn test_rejects_non_decimal_forms() {
        for bad in ["", " ", "-1", "1e18", "0x10", "1,5", "1.2.3", ".", "abc", "NaN", "inf"] {
            let err = parse_units(bad, 18).unwrap_err();
            assert_eq!(err.kind(), "invalid_amount", "input {bad:?}");
        }
    }

    #[test]
    fn test_parse_positive() {
        assert!(parse_positive("0", 18).is_err());
        assert!(parse_positive("0.000", 6).is_err());
        assert!(parse_positive("-0.1", 18).is_err());
        assert_eq!(parse_positive("0.000001", 6).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_overflow_rejected() {
        let huge = "9".repeat(80);
        assert!(parse_units(&huge, 18).is_err());
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
        assert_eq!(format_units(U256::from(1_000_000u64), 6), "1");
    }

    #[test]
    fn test_lossless_at_declared_precision() {
        let cases = [
            ("0.000001", 6),
            ("123.456789", 6),
            ("1", 18),
            ("0.000000000000000001", 18),
            ("98765.4321", 18),
            ("115792089237316195423570985008687907853269984665640564039457.584007913129639935", 18),
        ];
        for (human, decimals) in cases {
            let raw = parse_units(human, decimals).unwrap();
            assert_eq!(format_units(raw, decimals), human);
        }
    }

    #[test]
    fn test_normalize() {
        let one_usdc = parse_units("1", 6).unwrap();
        let one_eth = parse_units("1", 18).unwrap();
        assert_eq!(normalize(one_usdc, 6), Some(one_eth));
        assert_eq!(normalize(one_eth, 18), Some(one_eth));
    }

    #[test]
    fn test_amount_view() {
        let view = AmountView::from(Amount::parse("2.5", 6).unwrap());
        assert_eq!(view.raw_amount, "2500000");
        assert_eq!(view.decimals, 6);
        assert_eq!(view.human_amount, "2.5");
    }
}
