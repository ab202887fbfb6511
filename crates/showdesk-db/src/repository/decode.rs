//! Conversions from stored string columns back into domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use showdesk_core::money::round_money;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn uuid(entity: &'static str, field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::decode(entity, format!("invalid {field} UUID: {e}")))
}

pub(crate) fn opt_uuid(
    entity: &'static str,
    field: &str,
    raw: Option<&str>,
) -> Result<Option<Uuid>, DbError> {
    raw.map(|raw| uuid(entity, field, raw)).transpose()
}

pub(crate) fn money(entity: &'static str, field: &str, raw: &str) -> Result<Decimal, DbError> {
    raw.parse::<Decimal>()
        .map(round_money)
        .map_err(|e| DbError::decode(entity, format!("invalid {field} amount {raw:?}: {e}")))
}

pub(crate) fn date(entity: &'static str, field: &str, raw: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| DbError::decode(entity, format!("invalid {field} date {raw:?}: {e}")))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored enum name with the type's own `parse` function.
pub(crate) fn variant<T>(
    entity: &'static str,
    field: &str,
    raw: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, DbError> {
    parse(raw).ok_or_else(|| DbError::decode(entity, format!("unknown {field} {raw:?}")))
}

/// Mean of the positive amounts, rounded to the money scale.
pub(crate) fn positive_mean(
    entity: &'static str,
    field: &str,
    raw: &[String],
) -> Result<Option<Decimal>, DbError> {
    let mut sum = Decimal::ZERO;
    let mut count = 0u32;
    for value in raw {
        let amount = money(entity, field, value)?;
        if amount > Decimal::ZERO {
            sum += amount;
            count += 1;
        }
    }
    if count == 0 {
        return Ok(None);
    }
    Ok(Some(round_money(sum / Decimal::from(count))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn mean_ignores_zero_entries() {
        let raw = vec!["1000.00".to_string(), "0.00".into(), "1500.00".into()];
        assert_eq!(
            positive_mean("t", "amount", &raw).unwrap(),
            Some(dec!(1250.00))
        );
        assert_eq!(positive_mean("t", "amount", &["0".into()]).unwrap(), None);
        assert_eq!(positive_mean("t", "amount", &[]).unwrap(), None);
    }

    #[test]
    fn mean_rounds_half_away_from_zero() {
        let raw = vec!["0.01".to_string(), "0.02".into()];
        assert_eq!(
            positive_mean("t", "amount", &raw).unwrap(),
            Some(dec!(0.02))
        );
    }

    #[test]
    fn corrupt_values_are_reported() {
        assert!(money("show", "face_value", "12,50").is_err());
        assert!(date("show", "show_date", "20/11/2026").is_err());
        assert_eq!(
            format_date(date("show", "show_date", "2026-11-20").unwrap()),
            "2026-11-20"
        );
    }
}
