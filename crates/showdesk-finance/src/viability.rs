//! Viability projector.
//!
//! Estimates the travel cost of a prospective show from the tenant's own
//! history and classifies the proposed cache as VIABLE or RISKY. For each
//! cost category the average comes from the first source that has data:
//! realized ledger entries, then the reference cost table, then a fixed
//! default.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::capability::Capability;
use showdesk_core::models::city_cost::{CityBaseCost, CityCostFilter, CreateCityBaseCost};
use showdesk_core::models::transaction::TransactionCategory;
use showdesk_core::money::{ratio_percent, round_money, validate_amount};
use showdesk_core::repository::{
    CityCostRepository, DateWindow, HistoricalCostReader, PaginatedResult, Pagination,
};
use tracing::info;
use uuid::Uuid;

use crate::config::FinanceConfig;
use crate::error::FinanceError;

/// A prospective show to evaluate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub city: String,
    pub uf: String,
    pub proposed_cache: Decimal,
    /// Travellers needing a flight.
    pub transport_qty: u32,
    pub hotel_nights: u32,
}

/// Where an average came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostSource {
    Realized,
    Reference,
    Default,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Viable,
    Risky,
}

/// Averages gathered for one category, before the fallback is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostHistory {
    pub realized: Option<Decimal>,
    pub reference: Option<Decimal>,
}

impl CostHistory {
    /// Pick the first source with a positive average.
    pub fn choose(&self, default: Decimal) -> (Decimal, CostSource) {
        let positive = |v: &Decimal| *v > Decimal::ZERO;
        if let Some(avg) = self.realized.filter(positive) {
            (round_money(avg), CostSource::Realized)
        } else if let Some(avg) = self.reference.filter(positive) {
            (round_money(avg), CostSource::Reference)
        } else {
            (round_money(default), CostSource::Default)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostEstimate {
    pub category: TransactionCategory,
    pub average: Decimal,
    pub source: CostSource,
    /// Units the average was multiplied by: tickets, or room-nights.
    pub units: u64,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationResult {
    pub city: String,
    pub uf: String,
    pub proposed_cache: Decimal,
    pub window: DateWindow,
    pub flight: CostEstimate,
    pub hotel: CostEstimate,
    pub hotel_rooms: u32,
    pub projected_total_cost: Decimal,
    pub projected_margin: Decimal,
    pub margin_percent: Decimal,
    pub verdict: Verdict,
    /// Set when at least one category fell back to the default.
    pub note: Option<String>,
}

impl SimulationInput {
    fn validated(mut self) -> Result<Self, FinanceError> {
        if self.proposed_cache < Decimal::ZERO {
            return Err(FinanceError::NegativeCache);
        }
        self.proposed_cache = validate_amount("proposed_cache", self.proposed_cache)
            .map_err(|e| FinanceError::InvalidParameter(e.to_string()))?;
        self.city = self.city.trim().to_string();
        if self.city.is_empty() {
            return Err(FinanceError::InvalidParameter("city must not be empty".into()));
        }
        self.uf = self.uf.trim().to_ascii_uppercase();
        if self.uf.len() != 2 || !self.uf.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FinanceError::InvalidParameter(format!(
                "uf must be a two-letter state code, got {:?}",
                self.uf
            )));
        }
        Ok(self)
    }
}

/// Rooms needed to lodge `travellers`; at least one when anyone stays.
pub fn rooms_needed(travellers: u32, nights: u32, guests_per_room: u32) -> u32 {
    if nights == 0 {
        return 0;
    }
    travellers.div_ceil(guests_per_room.max(1)).max(1)
}

fn estimate(
    category: TransactionCategory,
    (average, source): (Decimal, CostSource),
    units: u64,
) -> Result<CostEstimate, FinanceError> {
    let total = average
        .checked_mul(Decimal::from(units))
        .ok_or(FinanceError::Overflow(category.as_str()))?;
    Ok(CostEstimate {
        category,
        average,
        source,
        units,
        total: round_money(total),
    })
}

/// Project costs and classify. Pure: all history is passed in.
pub fn project(
    input: SimulationInput,
    window: DateWindow,
    flight: CostHistory,
    hotel: CostHistory,
    config: &FinanceConfig,
) -> Result<SimulationResult, FinanceError> {
    let input = input.validated()?;

    let flight = estimate(
        TransactionCategory::Flight,
        flight.choose(config.default_flight_cost),
        u64::from(input.transport_qty),
    )?;
    let hotel_rooms = rooms_needed(input.transport_qty, input.hotel_nights, config.guests_per_room);
    let hotel = estimate(
        TransactionCategory::Hotel,
        hotel.choose(config.default_hotel_cost),
        u64::from(input.hotel_nights) * u64::from(hotel_rooms),
    )?;

    let projected_total_cost = flight
        .total
        .checked_add(hotel.total)
        .ok_or(FinanceError::Overflow("projected total cost"))?;
    let projected_margin = input
        .proposed_cache
        .checked_sub(projected_total_cost)
        .map(round_money)
        .ok_or(FinanceError::Overflow("projected margin"))?;
    let margin_percent = ratio_percent(projected_margin, input.proposed_cache)
        .ok_or(FinanceError::Overflow("margin percent"))?;
    let verdict = if margin_percent >= config.viability_threshold {
        Verdict::Viable
    } else {
        Verdict::Risky
    };

    let defaulted: Vec<&str> = [&flight, &hotel]
        .into_iter()
        .filter(|e| e.source == CostSource::Default)
        .map(|e| e.category.as_str())
        .collect();
    let note = (!defaulted.is_empty()).then(|| {
        format!(
            "no cost history for {}/{}; default averages used for {}",
            input.city,
            input.uf,
            defaulted.join(", ")
        )
    });

    Ok(SimulationResult {
        city: input.city,
        uf: input.uf,
        proposed_cache: input.proposed_cache,
        window,
        flight,
        hotel,
        hotel_rooms,
        projected_total_cost,
        projected_margin,
        margin_percent,
        verdict,
        note,
    })
}

/// Viability simulation and reference cost maintenance.
pub struct ViabilityService<H: HistoricalCostReader, C: CityCostRepository> {
    history: H,
    city_costs: C,
    config: FinanceConfig,
}

impl<H: HistoricalCostReader, C: CityCostRepository> ViabilityService<H, C> {
    pub fn new(history: H, city_costs: C, config: FinanceConfig) -> Self {
        Self {
            history,
            city_costs,
            config,
        }
    }

    pub async fn simulate(
        &self,
        ctx: &TenantContext,
        input: SimulationInput,
    ) -> ShowdeskResult<SimulationResult> {
        self.simulate_on(ctx, input, Utc::now().date_naive()).await
    }

    /// Simulate as of `today`, which anchors the history window.
    pub async fn simulate_on(
        &self,
        ctx: &TenantContext,
        input: SimulationInput,
        today: NaiveDate,
    ) -> ShowdeskResult<SimulationResult> {
        ctx.require(Capability::SimulateShows)?;
        let input = input.validated()?;
        let window = DateWindow::trailing(today, self.config.history_window_days);

        let flight = self
            .gather(ctx, &input, TransactionCategory::Flight, window)
            .await?;
        let hotel = self
            .gather(ctx, &input, TransactionCategory::Hotel, window)
            .await?;

        let result = project(input, window, flight, hotel, &self.config)?;
        info!(
            tenant_id = %ctx.tenant_id(),
            city = %result.city,
            uf = %result.uf,
            flight_source = ?result.flight.source,
            hotel_source = ?result.hotel.source,
            verdict = ?result.verdict,
            "Viability simulated"
        );
        Ok(result)
    }

    async fn gather(
        &self,
        ctx: &TenantContext,
        input: &SimulationInput,
        category: TransactionCategory,
        window: DateWindow,
    ) -> ShowdeskResult<CostHistory> {
        let realized = self
            .history
            .realized_average(ctx, &input.city, &input.uf, category, window)
            .await?;
        if realized.is_some_and(|avg| avg > Decimal::ZERO) {
            return Ok(CostHistory {
                realized,
                reference: None,
            });
        }
        let reference = self
            .history
            .reference_average(ctx, &input.city, &input.uf, category, window)
            .await?;
        Ok(CostHistory {
            realized,
            reference,
        })
    }

    pub async fn record_city_cost(
        &self,
        ctx: &TenantContext,
        input: CreateCityBaseCost,
    ) -> ShowdeskResult<CityBaseCost> {
        ctx.require(Capability::ManageCostHistory)?;
        self.city_costs.create(ctx, input.validated()?).await
    }

    pub async fn list_city_costs(
        &self,
        ctx: &TenantContext,
        filter: CityCostFilter,
        pagination: Pagination,
    ) -> ShowdeskResult<PaginatedResult<CityBaseCost>> {
        ctx.require(Capability::ManageCostHistory)?;
        self.city_costs.list(ctx, filter, pagination).await
    }

    pub async fn delete_city_cost(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<()> {
        ctx.require(Capability::ManageCostHistory)?;
        self.city_costs.delete(ctx, id).await
    }
}
