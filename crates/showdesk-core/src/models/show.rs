//! Show domain model.
//!
//! A show is the central business object: every ledger entry and
//! commission hangs off exactly one show. Its lifecycle fields live in
//! [`Lifecycle`](crate::lifecycle::Lifecycle) and are only changed through
//! the state machine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ShowdeskError, ShowdeskResult};
use crate::lifecycle::Lifecycle;
use crate::money::{validate_amount, validate_percentage};

/// Lifecycle stage of a show. Declaration order is lifecycle order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShowStatus {
    Prospect,
    Proposal,
    ContractPending,
    Signed,
    PreProduction,
    OnTheRoad,
    Completed,
}

impl ShowStatus {
    pub const ALL: [ShowStatus; 7] = [
        Self::Prospect,
        Self::Proposal,
        Self::ContractPending,
        Self::Signed,
        Self::PreProduction,
        Self::OnTheRoad,
        Self::Completed,
    ];

    /// Stages in which no cost may be recorded.
    pub const COST_LOCKED: [ShowStatus; 3] =
        [Self::Prospect, Self::Proposal, Self::ContractPending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prospect => "Prospect",
            Self::Proposal => "Proposal",
            Self::ContractPending => "ContractPending",
            Self::Signed => "Signed",
            Self::PreProduction => "PreProduction",
            Self::OnTheRoad => "OnTheRoad",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Cost-eligibility predicate: the contract phase is over.
    pub fn accepts_costs(&self) -> bool {
        !Self::COST_LOCKED.contains(self)
    }
}

/// Who the contracting party is. Public-sector shows carry a production
/// kickback that flows through the books.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    Private,
    Public,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "Private",
            Self::Public => "Public",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Private" => Some(Self::Private),
            "Public" => Some(Self::Public),
            _ => None,
        }
    }
}

/// Who bears which costs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationType {
    /// Contractor pays the fee and buys all travel and lodging.
    FeePlusExpenses,
    /// Contractor pays a full price; the agency bears all logistics.
    AllInclusive,
    /// Agency pays flights; contractor covers hotel and local transport.
    FeePlusAirfare,
    Custom,
}

impl NegotiationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeePlusExpenses => "FeePlusExpenses",
            Self::AllInclusive => "AllInclusive",
            Self::FeePlusAirfare => "FeePlusAirfare",
            Self::Custom => "Custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FeePlusExpenses" => Some(Self::FeePlusExpenses),
            "AllInclusive" => Some(Self::AllInclusive),
            "FeePlusAirfare" => Some(Self::FeePlusAirfare),
            "Custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub artist_id: Uuid,
    pub contractor_id: Option<Uuid>,
    pub venue_id: Option<Uuid>,
    pub client_type: ClientType,
    pub negotiation_type: NegotiationType,
    pub show_date: NaiveDate,
    pub city: String,
    /// Two-letter state code.
    pub uf: String,
    /// Nominal invoice amount.
    pub face_value: Decimal,
    /// Amount the agency actually retains. Never exceeds `face_value`.
    pub real_cache: Decimal,
    /// Public-sector pass-through. Never profit.
    pub production_kickback: Decimal,
    pub tax_percentage: Decimal,
    pub notes: Option<String>,
    pub lifecycle: Lifecycle,
    /// Optimistic-concurrency counter, bumped on every write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Show {
    pub fn status(&self) -> ShowStatus {
        self.lifecycle.status
    }

    pub fn contract_validated(&self) -> bool {
        self.lifecycle.contract.is_some()
    }

    pub fn road_closed(&self) -> bool {
        self.lifecycle.road_closed_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShow {
    pub artist_id: Uuid,
    pub contractor_id: Option<Uuid>,
    pub venue_id: Option<Uuid>,
    pub client_type: ClientType,
    pub negotiation_type: NegotiationType,
    pub show_date: NaiveDate,
    pub city: String,
    pub uf: String,
    pub face_value: Decimal,
    pub real_cache: Decimal,
    pub production_kickback: Decimal,
    pub tax_percentage: Decimal,
    pub notes: Option<String>,
}

impl CreateShow {
    /// Check shape and monetary invariants, returning the normalised input.
    pub fn validated(mut self) -> ShowdeskResult<Self> {
        self.face_value = validate_amount("face_value", self.face_value)?;
        self.real_cache = validate_amount("real_cache", self.real_cache)?;
        self.production_kickback =
            validate_amount("production_kickback", self.production_kickback)?;
        self.tax_percentage = validate_percentage("tax_percentage", self.tax_percentage)?;
        self.city = validate_city(&self.city)?;
        self.uf = validate_uf(&self.uf)?;
        check_cache_within_face(self.real_cache, self.face_value)?;
        Ok(self)
    }
}

/// Fields that can be changed outside the lifecycle. `None` = no change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateShow {
    /// `Some(Some(v))` = set, `Some(None)` = clear, `None` = no change.
    pub contractor_id: Option<Option<Uuid>>,
    pub venue_id: Option<Option<Uuid>>,
    pub client_type: Option<ClientType>,
    pub negotiation_type: Option<NegotiationType>,
    pub show_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub uf: Option<String>,
    pub face_value: Option<Decimal>,
    pub real_cache: Option<Decimal>,
    pub production_kickback: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub notes: Option<Option<String>>,
}

impl UpdateShow {
    /// Apply the patch to `show`, enforcing the same invariants as creation
    /// plus the negotiation lock once the contract is validated.
    pub fn apply_to(self, show: &Show) -> ShowdeskResult<Show> {
        if let Some(negotiation) = self.negotiation_type
            && negotiation != show.negotiation_type
            && show.contract_validated()
        {
            return Err(ShowdeskError::invalid_state(
                "negotiation type cannot change after the contract is validated",
            ));
        }

        let mut next = show.clone();
        if let Some(contractor_id) = self.contractor_id {
            next.contractor_id = contractor_id;
        }
        if let Some(venue_id) = self.venue_id {
            next.venue_id = venue_id;
        }
        if let Some(client_type) = self.client_type {
            next.client_type = client_type;
        }
        if let Some(negotiation) = self.negotiation_type {
            next.negotiation_type = negotiation;
        }
        if let Some(show_date) = self.show_date {
            next.show_date = show_date;
        }
        if let Some(city) = self.city {
            next.city = validate_city(&city)?;
        }
        if let Some(uf) = self.uf {
            next.uf = validate_uf(&uf)?;
        }
        if let Some(v) = self.face_value {
            next.face_value = validate_amount("face_value", v)?;
        }
        if let Some(v) = self.real_cache {
            next.real_cache = validate_amount("real_cache", v)?;
        }
        if let Some(v) = self.production_kickback {
            next.production_kickback = validate_amount("production_kickback", v)?;
        }
        if let Some(v) = self.tax_percentage {
            next.tax_percentage = validate_percentage("tax_percentage", v)?;
        }
        if let Some(notes) = self.notes {
            next.notes = notes;
        }
        check_cache_within_face(next.real_cache, next.face_value)?;
        Ok(next)
    }
}

fn check_cache_within_face(real_cache: Decimal, face_value: Decimal) -> ShowdeskResult<()> {
    if real_cache > face_value {
        return Err(ShowdeskError::validation(format!(
            "real_cache ({real_cache}) must not exceed face_value ({face_value})"
        )));
    }
    Ok(())
}

fn validate_city(city: &str) -> ShowdeskResult<String> {
    let city = city.trim();
    if city.is_empty() {
        return Err(ShowdeskError::validation("city must not be empty"));
    }
    Ok(city.to_string())
}

fn validate_uf(uf: &str) -> ShowdeskResult<String> {
    let uf = uf.trim();
    if uf.len() != 2 || !uf.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ShowdeskError::validation(format!(
            "uf must be a two-letter state code, got {uf:?}"
        )));
    }
    Ok(uf.to_ascii_uppercase())
}
