//! Historical reference costs per city.
//!
//! Maintained by hand per tenant and used by the viability projector when
//! the tenant has no realized data for a city.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ShowdeskError, ShowdeskResult};
use crate::models::transaction::TransactionCategory;
use crate::money::validate_amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityBaseCost {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub city: String,
    pub uf: String,
    pub category: TransactionCategory,
    pub amount: Decimal,
    pub reference_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCityBaseCost {
    pub city: String,
    pub uf: String,
    pub category: TransactionCategory,
    pub amount: Decimal,
    pub reference_date: NaiveDate,
}

impl CreateCityBaseCost {
    pub fn validated(mut self) -> ShowdeskResult<Self> {
        self.city = self.city.trim().to_string();
        if self.city.is_empty() {
            return Err(ShowdeskError::validation("city must not be empty"));
        }
        self.uf = self.uf.trim().to_ascii_uppercase();
        if self.uf.len() != 2 || !self.uf.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ShowdeskError::validation("uf must be a two-letter state code"));
        }
        self.amount = validate_amount("amount", self.amount)?;
        Ok(self)
    }
}

/// Filter for listing reference costs. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CityCostFilter {
    pub city: Option<String>,
    pub uf: Option<String>,
    pub category: Option<TransactionCategory>,
}
