//! Commission registry entries.
//!
//! A commission only stores a percentage and a basis; its monetary value
//! is computed by the DRE engine on every read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ShowdeskError, ShowdeskResult};
use crate::money::validate_percentage;

/// What the percentage applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionBasis {
    /// Gross revenue, before any deduction.
    Gross,
    /// Net profit after taxes, pass-through, costs and gross commissions.
    Net,
}

impl CommissionBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gross => "Gross",
            Self::Net => "Net",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Gross" => Some(Self::Gross),
            "Net" => Some(Self::Net),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commission {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub show_id: Uuid,
    pub beneficiary_name: String,
    /// Internal user the commission is paid to, if any.
    pub beneficiary_user_id: Option<Uuid>,
    pub basis: CommissionBasis,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommission {
    pub show_id: Uuid,
    pub beneficiary_name: String,
    pub beneficiary_user_id: Option<Uuid>,
    pub basis: CommissionBasis,
    pub percentage: Decimal,
}

impl CreateCommission {
    pub fn validated(mut self) -> ShowdeskResult<Self> {
        let name = self.beneficiary_name.trim();
        if name.is_empty() {
            return Err(ShowdeskError::validation("beneficiary_name must not be empty"));
        }
        self.beneficiary_name = name.to_string();
        self.percentage = validate_percentage("percentage", self.percentage)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(name: &str, percentage: Decimal) -> CreateCommission {
        CreateCommission {
            show_id: Uuid::new_v4(),
            beneficiary_name: name.into(),
            beneficiary_user_id: None,
            basis: CommissionBasis::Net,
            percentage,
        }
    }

    #[test]
    fn percentage_must_be_in_range() {
        assert!(input("Booker", dec!(100.01)).validated().is_err());
        assert!(input("Booker", dec!(-0.5)).validated().is_err());
        assert!(input("Booker", dec!(12.345)).validated().is_err());
        assert_eq!(
            input("Booker", dec!(15)).validated().unwrap().percentage,
            dec!(15.00)
        );
    }

    #[test]
    fn beneficiary_is_trimmed_and_required() {
        assert!(input("   ", dec!(5)).validated().is_err());
        assert_eq!(
            input("  Office  ", dec!(5)).validated().unwrap().beneficiary_name,
            "Office"
        );
    }
}
