// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion between user-entered decimal amounts and atomic token units.
//!
//! Atomic amounts are held as [`U256`] end to end. An 18-decimal token easily
//! exceeds the range an `f64` represents exactly, so no conversion in this
//! module goes through floating point.

use alloy::primitives::U256;

/// Display precision used for tokens with at most this many decimals.
const LOW_DECIMALS_THRESHOLD: u8 = 6;

/// Fraction digits shown for low-decimal (stable-coin-like) tokens.
const LOW_DECIMALS_PRECISION: u8 = 2;

/// Fraction digits shown for high-decimal tokens.
const HIGH_DECIMALS_PRECISION: u8 = 6;

/// Whether `text` is acceptable amount input: optional digits, an optional
/// single decimal point, optional digits.
///
/// Partial input such as `""`, `"."` and `"5."` is accepted so the user can
/// keep typing; it converts to zero.
pub fn is_amount_input(text: &str) -> bool {
    let mut seen_point = false;
    text.chars().all(|c| match c {
        '0'..='9' => true,
        '.' if !seen_point => {
            seen_point = true;
            true
        }
        _ => false,
    })
}

/// Number of fraction digits shown for a token with `decimals` precision.
pub fn display_precision(decimals: u8) -> u8 {
    if decimals <= LOW_DECIMALS_THRESHOLD {
        LOW_DECIMALS_PRECISION
    } else {
        HIGH_DECIMALS_PRECISION
    }
}

/// Parse a human-readable amount into atomic units.
///
/// Fraction digits beyond `decimals` are truncated, never rounded. Input that
/// is not a decimal number (see [`is_amount_input`]) or does not fit in 256
/// bits yields zero.
///
/// # Arguments
/// * `amount` - Amount as typed by the user (e.g., "5.00")
/// * `decimals` - Token decimals (6 for USDC, 18 for ETH)
pub fn to_atomic(amount: &str, decimals: u8) -> U256 {
    if !is_amount_input(amount) {
        return U256::ZERO;
    }

    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let places = decimals as usize;
    // Input is ASCII-only at this point, byte slicing is safe.
    let fraction = &fraction[..fraction.len().min(places)];

    let digits = format!("{whole}{fraction:0<places$}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return U256::ZERO;
    }

    U256::from_str_radix(digits, 10).unwrap_or(U256::ZERO)
}

/// Format an atomic amount for display.
///
/// Shows [`display_precision`] fraction digits, rounding half up on the exact
/// integer value.
pub fn from_atomic(atomic: U256, decimals: u8) -> String {
    let precision = display_precision(decimals);
    let scaled = rescale(atomic, decimals, precision);

    let places = precision as usize;
    let digits = format!("{:0>width$}", scaled.to_string(), width = places + 1);
    let (whole, fraction) = digits.split_at(digits.len() - places);
    format!("{whole}.{fraction}")
}

/// Rescale `atomic` from `decimals` fraction digits to `precision` digits,
/// rounding half up when digits are dropped.
fn rescale(atomic: U256, decimals: u8, precision: u8) -> U256 {
    if precision >= decimals {
        let factor = pow10(precision - decimals);
        return atomic.saturating_mul(factor);
    }

    let divisor = pow10(decimals - precision);
    let quotient = atomic / divisor;
    let remainder = atomic % divisor;
    if remainder.saturating_mul(U256::from(2u8)) >= divisor {
        quotient.saturating_add(U256::from(1u8))
    } else {
        quotient
    }
}

pub(crate) fn pow10(exponent: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exponent))
}

/// Parse an atomic amount as delivered by the API (a decimal string).
pub fn parse_atomic(raw: &str) -> Option<U256> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(raw, 10).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_input_pattern() {
        assert!(is_amount_input(""));
        assert!(is_amount_input("5"));
        assert!(is_amount_input("5."));
        assert!(is_amount_input(".5"));
        assert!(is_amount_input("0.001"));

        assert!(!is_amount_input("abc"));
        assert!(!is_amount_input("5.0.0"));
        assert!(!is_amount_input("-1"));
        assert!(!is_amount_input("1e5"));
        assert!(!is_amount_input(" 1"));
    }

    #[test]
    fn to_atomic_usdc() {
        assert_eq!(to_atomic("5.00", 6), U256::from(5_000_000u64));
        assert_eq!(to_atomic("1.5", 6), U256::from(1_500_000u64));
        assert_eq!(to_atomic(".25", 6), U256::from(250_000u64));
    }

    #[test]
    fn to_atomic_truncates_excess_fraction() {
        assert_eq!(to_atomic("1.2345678", 6), U256::from(1_234_567u64));
        assert_eq!(to_atomic("0.0000009", 6), U256::ZERO);
    }

    #[test]
    fn to_atomic_rejects_garbage_as_zero() {
        assert_eq!(to_atomic("abc", 18), U256::ZERO);
        assert_eq!(to_atomic("5.0.0", 18), U256::ZERO);
        assert_eq!(to_atomic("", 18), U256::ZERO);
        assert_eq!(to_atomic(".", 18), U256::ZERO);
        assert_eq!(to_atomic("000", 18), U256::ZERO);
    }

    #[test]
    fn to_atomic_provisional_trailing_point() {
        assert_eq!(to_atomic("5.", 6), U256::from(5_000_000u64));
    }

    #[test]
    fn to_atomic_exceeds_u128_without_loss() {
        // 10^21 ETH in wei is 10^39, beyond u128::MAX.
        let atomic = to_atomic("1000000000000000000000", 18);
        assert_eq!(atomic, U256::from(10u64).pow(U256::from(39u64)));
    }

    #[test]
    fn from_atomic_uses_display_precision() {
        assert_eq!(from_atomic(U256::from(5_000_000u64), 6), "5.00");
        assert_eq!(
            from_atomic(U256::from(2_000_000_000_000_000u64), 18),
            "0.002000"
        );
        assert_eq!(from_atomic(U256::ZERO, 18), "0.000000");
        assert_eq!(from_atomic(U256::ZERO, 6), "0.00");
        assert_eq!(from_atomic(U256::from(7u64), 0), "7.00");
    }

    #[test]
    fn from_atomic_rounds_half_up() {
        assert_eq!(from_atomic(U256::from(1_234_999u64), 6), "1.23");
        assert_eq!(from_atomic(U256::from(1_235_000u64), 6), "1.24");
        assert_eq!(
            from_atomic(U256::from(1_999_999_500_000_000_000u64), 18),
            "2.000000"
        );
    }

    #[test]
    fn round_trip_at_display_precision() {
        for (text, decimals) in [
            ("5.00", 6u8),
            ("0.01", 6),
            ("1234.56", 6),
            ("0.001000", 18),
            ("42.123456", 18),
            ("0.000001", 18),
        ] {
            assert_eq!(from_atomic(to_atomic(text, decimals), decimals), text);
        }
    }

    #[test]
    fn parse_atomic_accepts_only_digits() {
        assert_eq!(parse_atomic("2000000000000000"), Some(U256::from(2_000_000_000_000_000u64)));
        assert_eq!(parse_atomic(" 10 "), Some(U256::from(10u64)));
        assert_eq!(parse_atomic(""), None);
        assert_eq!(parse_atomic("0x10"), None);
        assert_eq!(parse_atomic("1.5"), None);
    }
}
