//! Fixed-point money helpers.
//!
//! All monetary amounts and percentages carry a scale of 2. Computed values
//! are rounded half away from zero; inputs with more precision are rejected
//! rather than silently rounded. Inputs are capped at [`MAX_AMOUNT`], and
//! the derived helpers return `None` instead of overflowing.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::{ShowdeskError, ShowdeskResult};

/// Decimal places carried by every amount and percentage.
pub const MONEY_SCALE: u32 = 2;

/// Largest accepted monetary input, 10^15.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round to the money scale and normalise the representation to exactly two
/// decimal places, so `15300` and `15300.000` both become `15300.00`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `base * percentage / 100`, rounded to the money scale.
pub fn percent_of(base: Decimal, percentage: Decimal) -> Option<Decimal> {
    base.checked_mul(percentage)?
        .checked_div(HUNDRED)
        .map(round_money)
}

/// Sum of `values`, rounded to the money scale.
pub fn checked_total(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
        .map(round_money)
}

/// `part / whole * 100`, or zero when `whole` is not positive.
pub fn ratio_percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole <= Decimal::ZERO {
        return Some(round_money(Decimal::ZERO));
    }
    part.checked_div(whole)?
        .checked_mul(HUNDRED)
        .map(round_money)
}

/// Validate a monetary input: within `[0, MAX_AMOUNT]` and at most two
/// decimal places.
pub fn validate_amount(field: &str, value: Decimal) -> ShowdeskResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(ShowdeskError::validation(format!("{field} must not be negative")));
    }
    if value > MAX_AMOUNT {
        return Err(ShowdeskError::validation(format!(
            "{field} must not exceed {MAX_AMOUNT}, got {value}"
        )));
    }
    validate_scale(field, value)
}

/// Validate a percentage input: within `[0, 100]`, at most two decimal places.
pub fn validate_percentage(field: &str, value: Decimal) -> ShowdeskResult<Decimal> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(ShowdeskError::validation(format!(
            "{field} must be between 0 and 100, got {value}"
        )));
    }
    validate_scale(field, value)
}

fn validate_scale(field: &str, value: Decimal) -> ShowdeskResult<Decimal> {
    let normalized = value.normalize();
    if normalized.scale() > MONEY_SCALE {
        return Err(ShowdeskError::validation(format!(
            "{field} supports at most {MONEY_SCALE} decimal places, got {value}"
        )));
    }
    Ok(round_money(value))
}

/// Parse a stored decimal string.
pub fn parse_money(field: &str, raw: &str) -> ShowdeskResult<Decimal> {
    raw.parse::<Decimal>()
        .map(round_money)
        .map_err(|e| ShowdeskError::Internal(format!("corrupt {field} value {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_keeps_two_places() {
        assert_eq!(
            percent_of(dec!(180000.00), dec!(8.5)).unwrap().to_string(),
            "15300.00"
        );
        assert_eq!(percent_of(dec!(100.00), dec!(33.33)), Some(dec!(33.33)));
        assert_eq!(percent_of(dec!(0.05), dec!(50)), Some(dec!(0.03)));
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio_percent(dec!(10), Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(ratio_percent(dec!(10), dec!(-5)), Some(Decimal::ZERO));
        assert_eq!(ratio_percent(dec!(98175.00), dec!(180000.00)), Some(dec!(54.54)));
    }

    #[test]
    fn derived_values_report_overflow() {
        let huge = dec!(10000000000000000000000000);
        assert_eq!(ratio_percent(-huge, dec!(0.01)), None);
        assert_eq!(percent_of(Decimal::MAX, dec!(50)), None);
        assert!(ratio_percent(-MAX_AMOUNT, dec!(0.01)).is_some());
        assert_eq!(checked_total([Decimal::MAX, dec!(1)]), None);
        assert_eq!(checked_total([dec!(1.5), dec!(2)]).unwrap().to_string(), "3.50");
    }

    #[test]
    fn amounts_are_capped() {
        assert_eq!(validate_amount("real_cache", MAX_AMOUNT).unwrap(), MAX_AMOUNT);
        let err = validate_amount("realized_amount", dec!(10000000000000000000000000)).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(validate_amount("realized_amount", MAX_AMOUNT + dec!(0.01)).is_err());
    }

    #[test]
    fn rejects_excess_precision() {
        assert!(validate_amount("face_value", dec!(10.001)).is_err());
        assert_eq!(validate_amount("face_value", dec!(10.100)).unwrap(), dec!(10.10));
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(validate_amount("realized_amount", dec!(-0.01)).is_err());
        assert!(validate_amount("realized_amount", Decimal::ZERO).is_ok());
    }

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage("percentage", dec!(100)).is_ok());
        assert!(validate_percentage("percentage", dec!(0)).is_ok());
        assert!(validate_percentage("percentage", dec!(100.01)).is_err());
        assert!(validate_percentage("percentage", dec!(-1)).is_err());
    }

    #[test]
    fn parse_money_normalises_scale() {
        assert_eq!(parse_money("x", "12.5").unwrap().to_string(), "12.50");
        assert!(parse_money("x", "twelve").is_err());
    }
}
