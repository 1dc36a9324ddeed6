//! Amount and rate normalization.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse an amount as printed on an invoice (e.g., "1,23,456.78" or "1180").
///
/// Thousands separators are stripped. Negative values are rejected: a
/// tax-invoice amount never is.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{00a0}' | '\''))
        .collect();

    let amount = Decimal::from_str(&cleaned).ok()?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    Some(amount)
}

/// Parse a percentage, with or without a trailing `%`.
pub fn parse_rate(s: &str) -> Option<Decimal> {
    parse_amount(s.trim().trim_end_matches('%'))
}

/// Integer percentage, rounding halves up (`floor(x + 0.5)`).
///
/// `None` for negative or out-of-range values.
pub fn round_half_up(value: Decimal) -> Option<u32> {
    value.checked_add(Decimal::new(5, 1))?.floor().to_u32()
}

/// Sum of amounts; `None` if it overflows.
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

/// Round a currency amount to 2 decimal places, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with exactly 2 decimal places.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1180"), Some(d("1180")));
        assert_eq!(parse_amount("1,180.50"), Some(d("1180.50")));
        assert_eq!(parse_amount("1,23,456.78"), Some(d("123456.78")));
        assert_eq!(parse_amount(" 434.52 "), Some(d("434.52")));
    }

    #[test]
    fn test_parse_amount_rejects_garbage_and_negatives() {
        assert_eq!(parse_amount("-180"), None);
        assert_eq!(parse_amount("1.000.00"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("18%"), Some(d("18")));
        assert_eq!(parse_rate("2.5"), Some(d("2.5")));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(d("18")), Some(18));
        assert_eq!(round_half_up(d("8.5")), Some(9));
        assert_eq!(round_half_up(d("8.97")), Some(9));
        assert_eq!(round_half_up(d("2.5")), Some(3));
        assert_eq!(round_half_up(d("2.49")), Some(2));
        assert_eq!(round_half_up(d("-3")), None);
        assert_eq!(round_half_up(Decimal::MAX), None);
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum([d("90"), d("90.50")]), Some(d("180.50")));
        assert_eq!(checked_sum([]), Some(Decimal::ZERO));
        assert_eq!(checked_sum([Decimal::MAX, d("1")]), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(d("244.2")), "244.20");
        assert_eq!(format_amount(d("90")), "90.00");
        assert_eq!(format_amount(d("0.125")), "0.13");
    }
}
