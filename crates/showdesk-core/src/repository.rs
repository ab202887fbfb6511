//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories take a
//! [`TenantContext`] as their first argument and apply its tenant id as a
//! mandatory predicate on every query. A row that exists under another
//! tenant is reported exactly like a missing row.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::TenantContext;
use crate::error::ShowdeskResult;
use crate::lifecycle::Lifecycle;
use crate::models::{
    checkin::{CheckinBatch, CheckinOutcome, ShowCheckin},
    city_cost::{CityBaseCost, CityCostFilter, CreateCityBaseCost},
    commission::{Commission, CreateCommission},
    show::{CreateShow, Show, ShowStatus},
    tenant::{CreateTenant, Tenant, TenantStatus},
    transaction::{Correction, FinancialTransaction, NewTransaction, TransactionCategory},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// The `days`-long window ending on `today`.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        Self {
            from: today - chrono::Days::new(u64::from(days)),
            to: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Filter for listing shows.
#[derive(Debug, Clone, Default)]
pub struct ShowFilter {
    pub status: Option<ShowStatus>,
}

/// Everything the DRE engine reads for one show, taken from a single
/// consistent read.
#[derive(Debug, Clone)]
pub struct SettlementSnapshot {
    pub show: Show,
    pub transactions: Vec<FinancialTransaction>,
    pub commissions: Vec<Commission>,
}

// ---------------------------------------------------------------------------
// Tenant (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = ShowdeskResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ShowdeskResult<Tenant>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = ShowdeskResult<PaginatedResult<Tenant>>> + Send;
    /// Subscription change driven by the billing provider.
    fn set_subscription(
        &self,
        id: Uuid,
        status: TenantStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> impl Future<Output = ShowdeskResult<Tenant>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait ShowRepository: Send + Sync {
    fn create(
        &self,
        ctx: &TenantContext,
        input: CreateShow,
    ) -> impl Future<Output = ShowdeskResult<Show>> + Send;
    fn get(&self, ctx: &TenantContext, id: Uuid)
    -> impl Future<Output = ShowdeskResult<Show>> + Send;
    fn list(
        &self,
        ctx: &TenantContext,
        filter: ShowFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ShowdeskResult<PaginatedResult<Show>>> + Send;
    fn count(&self, ctx: &TenantContext) -> impl Future<Output = ShowdeskResult<u64>> + Send;
    /// Write the editable fields of `next` if the stored version still
    /// equals `next.version`. `Ok(None)` means another writer got there
    /// first.
    fn update_details(
        &self,
        ctx: &TenantContext,
        next: &Show,
    ) -> impl Future<Output = ShowdeskResult<Option<Show>>> + Send;
    /// Replace the lifecycle fields if the stored version still equals
    /// `expected_version`. `Ok(None)` means another writer got there first.
    fn transition(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        expected_version: u64,
        next: Lifecycle,
    ) -> impl Future<Output = ShowdeskResult<Option<Show>>> + Send;
    /// Hard delete together with the show's ledger entries and
    /// commissions. Fails with `InvalidState` once the road is closed.
    fn delete(&self, ctx: &TenantContext, id: Uuid)
    -> impl Future<Output = ShowdeskResult<()>> + Send;
}

pub trait LedgerRepository: Send + Sync {
    /// Append an entry. For cost types the show's status is checked in
    /// the same transaction as the insert and a locked show fails with
    /// `ContractNotSigned`.
    fn append(
        &self,
        ctx: &TenantContext,
        input: NewTransaction,
    ) -> impl Future<Output = ShowdeskResult<FinancialTransaction>> + Send;
    fn get(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> impl Future<Output = ShowdeskResult<FinancialTransaction>> + Send;
    /// Entries in insertion order.
    fn list_by_show(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> impl Future<Output = ShowdeskResult<Vec<FinancialTransaction>>> + Send;
    fn count_by_show(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> impl Future<Output = ShowdeskResult<u64>> + Send;
    fn correct(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        correction: Correction,
    ) -> impl Future<Output = ShowdeskResult<FinancialTransaction>> + Send;
    /// Fails with `InvalidState` once the owning show's road is closed.
    fn delete(&self, ctx: &TenantContext, id: Uuid)
    -> impl Future<Output = ShowdeskResult<()>> + Send;
}

pub trait CommissionRepository: Send + Sync {
    fn append(
        &self,
        ctx: &TenantContext,
        input: CreateCommission,
    ) -> impl Future<Output = ShowdeskResult<Commission>> + Send;
    fn list_by_show(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> impl Future<Output = ShowdeskResult<Vec<Commission>>> + Send;
    /// Fails with `InvalidState` once the owning show's road is closed.
    fn delete(&self, ctx: &TenantContext, id: Uuid)
    -> impl Future<Output = ShowdeskResult<()>> + Send;
}

pub trait CheckinRepository: Send + Sync {
    /// Record presence for every user in the batch not yet checked in to
    /// the show. Existing check-ins are left untouched. Fails with
    /// `NotFound` for a show outside the tenant and `InvalidState` once
    /// its road is closed.
    fn check_in(
        &self,
        ctx: &TenantContext,
        batch: CheckinBatch,
    ) -> impl Future<Output = ShowdeskResult<CheckinOutcome>> + Send;
    /// Check-ins in arrival order.
    fn list_by_show(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> impl Future<Output = ShowdeskResult<Vec<ShowCheckin>>> + Send;
}

pub trait CityCostRepository: Send + Sync {
    fn create(
        &self,
        ctx: &TenantContext,
        input: CreateCityBaseCost,
    ) -> impl Future<Output = ShowdeskResult<CityBaseCost>> + Send;
    fn list(
        &self,
        ctx: &TenantContext,
        filter: CityCostFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ShowdeskResult<PaginatedResult<CityBaseCost>>> + Send;
    fn delete(&self, ctx: &TenantContext, id: Uuid)
    -> impl Future<Output = ShowdeskResult<()>> + Send;
}

/// Consistent read of one show and everything hanging off it.
pub trait SettlementReader: Send + Sync {
    fn snapshot(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> impl Future<Output = ShowdeskResult<SettlementSnapshot>> + Send;
}

/// Aggregates over a tenant's cost history for one city.
///
/// Both methods return `None` when there is nothing to average.
pub trait HistoricalCostReader: Send + Sync {
    /// Mean positive realized amount of ledger entries in `category` on
    /// shows in the city whose show date lies inside `window`.
    fn realized_average(
        &self,
        ctx: &TenantContext,
        city: &str,
        uf: &str,
        category: TransactionCategory,
        window: DateWindow,
    ) -> impl Future<Output = ShowdeskResult<Option<Decimal>>> + Send;
    /// Mean of the manually maintained reference costs inside `window`.
    fn reference_average(
        &self,
        ctx: &TenantContext,
        city: &str,
        uf: &str,
        category: TransactionCategory,
        window: DateWindow,
    ) -> impl Future<Output = ShowdeskResult<Option<Decimal>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_window_is_inclusive() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let window = DateWindow::trailing(today, 365);
        assert_eq!(window.from, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert!(window.contains(today));
        assert!(window.contains(window.from));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()));
    }
}
