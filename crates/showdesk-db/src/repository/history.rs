//! Cost history aggregates for the viability projector.

use rust_decimal::Decimal;
use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::transaction::TransactionCategory;
use showdesk_core::repository::{DateWindow, HistoricalCostReader};
use surrealdb::{Connection, Surreal};
use tracing::debug;

use crate::error::DbError;
use crate::repository::decode;

/// Averages over a tenant's realized ledger entries and reference costs.
///
/// Cities are matched case-insensitively; states by their upper-case code.
#[derive(Clone)]
pub struct SurrealCostHistory<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCostHistory<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> HistoricalCostReader for SurrealCostHistory<C> {
    async fn realized_average(
        &self,
        ctx: &TenantContext,
        city: &str,
        uf: &str,
        category: TransactionCategory,
        window: DateWindow,
    ) -> ShowdeskResult<Option<Decimal>> {
        let tenant_id = ctx.tenant_id().to_string();

        let mut result = self
            .db
            .query(
                "SELECT VALUE meta::id(id) FROM show \
                 WHERE tenant_id = $tenant_id \
                 AND uf = $uf AND string::lowercase(city) = $city \
                 AND show_date >= $from AND show_date <= $to",
            )
            .bind(("tenant_id", tenant_id.clone()))
            .bind(("uf", uf.trim().to_ascii_uppercase()))
            .bind(("city", city.trim().to_lowercase()))
            .bind(("from", decode::format_date(window.from)))
            .bind(("to", decode::format_date(window.to)))
            .await
            .map_err(DbError::from)?;
        let show_ids: Vec<String> = result.take(0).map_err(DbError::from)?;
        if show_ids.is_empty() {
            return Ok(None);
        }

        let mut result = self
            .db
            .query(
                "SELECT VALUE realized_amount FROM financial_transaction \
                 WHERE tenant_id = $tenant_id AND category = $category \
                 AND show_id IN $show_ids",
            )
            .bind(("tenant_id", tenant_id))
            .bind(("category", category.as_str()))
            .bind(("show_ids", serde_json::Value::from(show_ids)))
            .await
            .map_err(DbError::from)?;
        let amounts: Vec<String> = result.take(0).map_err(DbError::from)?;

        let average = decode::positive_mean("financial_transaction", "realized_amount", &amounts)?;
        debug!(
            tenant_id = %ctx.tenant_id(),
            city,
            uf,
            category = category.as_str(),
            samples = amounts.len(),
            average = ?average,
            "Realized cost average"
        );
        Ok(average)
    }

    async fn reference_average(
        &self,
        ctx: &TenantContext,
        city: &str,
        uf: &str,
        category: TransactionCategory,
        window: DateWindow,
    ) -> ShowdeskResult<Option<Decimal>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE amount FROM city_base_cost \
                 WHERE tenant_id = $tenant_id \
                 AND uf = $uf AND string::lowercase(city) = $city \
                 AND category = $category \
                 AND reference_date >= $from AND reference_date <= $to",
            )
            .bind(("tenant_id", ctx.tenant_id().to_string()))
            .bind(("uf", uf.trim().to_ascii_uppercase()))
            .bind(("city", city.trim().to_lowercase()))
            .bind(("category", category.as_str()))
            .bind(("from", decode::format_date(window.from)))
            .bind(("to", decode::format_date(window.to)))
            .await
            .map_err(DbError::from)?;
        let amounts: Vec<String> = result.take(0).map_err(DbError::from)?;

        let average = decode::positive_mean("city_base_cost", "amount", &amounts)?;
        debug!(
            tenant_id = %ctx.tenant_id(),
            city,
            uf,
            category = category.as_str(),
            samples = amounts.len(),
            average = ?average,
            "Reference cost average"
        );
        Ok(average)
    }
}
