//! Process configuration, read once from `SHOWDESK_*` environment
//! variables at startup.

use std::str::FromStr;

use rust_decimal::Decimal;
use showdesk_db::DbConfig;
use showdesk_finance::FinanceConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Whether internal error detail may be returned to callers.
    pub fn exposes_error_detail(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub db: DbConfig,
    pub finance: FinanceConfig,
}

impl AppConfig {
    /// Build from the process environment, defaulting every unset variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_defaults = DbConfig::default();
        let finance_defaults = FinanceConfig::default();

        let db = DbConfig {
            url: lookup("SHOWDESK_DB_URL").unwrap_or(db_defaults.url),
            namespace: lookup("SHOWDESK_DB_NAMESPACE").unwrap_or(db_defaults.namespace),
            database: lookup("SHOWDESK_DB_DATABASE").unwrap_or(db_defaults.database),
            username: lookup("SHOWDESK_DB_USERNAME").unwrap_or(db_defaults.username),
            password: lookup("SHOWDESK_DB_PASSWORD").unwrap_or(db_defaults.password),
        };

        let finance = FinanceConfig {
            viability_threshold: parsed(
                &lookup,
                "SHOWDESK_VIABILITY_THRESHOLD",
                finance_defaults.viability_threshold,
            )?,
            default_flight_cost: parsed::<Decimal>(
                &lookup,
                "SHOWDESK_DEFAULT_FLIGHT_COST",
                finance_defaults.default_flight_cost,
            )?,
            default_hotel_cost: parsed::<Decimal>(
                &lookup,
                "SHOWDESK_DEFAULT_HOTEL_COST",
                finance_defaults.default_hotel_cost,
            )?,
            guests_per_room: parsed(
                &lookup,
                "SHOWDESK_GUESTS_PER_ROOM",
                finance_defaults.guests_per_room,
            )?,
            history_window_days: parsed(
                &lookup,
                "SHOWDESK_HISTORY_WINDOW_DAYS",
                finance_defaults.history_window_days,
            )?,
            max_write_attempts: parsed(
                &lookup,
                "SHOWDESK_MAX_WRITE_ATTEMPTS",
                finance_defaults.max_write_attempts,
            )?,
        };
        if finance.guests_per_room == 0 {
            return Err(ConfigError::Invalid {
                var: "SHOWDESK_GUESTS_PER_ROOM",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            environment: parsed(&lookup, "SHOWDESK_ENV", Environment::Production)?,
            db,
            finance,
        })
    }
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.db.namespace, "showdesk");
        assert_eq!(config.finance.guests_per_room, 2);
        assert_eq!(config.finance.history_window_days, 365);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("SHOWDESK_ENV", "dev"),
            ("SHOWDESK_DB_URL", "mem://"),
            ("SHOWDESK_DEFAULT_HOTEL_COST", "410.00"),
            ("SHOWDESK_VIABILITY_THRESHOLD", "25"),
        ])
        .unwrap();
        assert!(config.environment.exposes_error_detail());
        assert_eq!(config.db.url, "mem://");
        assert_eq!(config.finance.default_hotel_cost.to_string(), "410.00");
        assert_eq!(config.finance.viability_threshold, Decimal::from(25));
    }

    #[test]
    fn rejects_garbage() {
        let err = config(&[("SHOWDESK_GUESTS_PER_ROOM", "two")]).unwrap_err();
        assert!(err.to_string().contains("SHOWDESK_GUESTS_PER_ROOM"));

        assert!(config(&[("SHOWDESK_GUESTS_PER_ROOM", "0")]).is_err());
        assert!(config(&[("SHOWDESK_ENV", "staging")]).is_err());
    }
}
