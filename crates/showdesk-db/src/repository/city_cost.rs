//! SurrealDB implementation of [`CityCostRepository`].

use chrono::{DateTime, Utc};
use serde_json::json;
use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::city_cost::{CityBaseCost, CityCostFilter, CreateCityBaseCost};
use showdesk_core::models::transaction::TransactionCategory;
use showdesk_core::repository::{CityCostRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::decode;
use crate::repository::scoped::{Filter, TenantScoped};

pub(crate) const TABLE: &str = "city_base_cost";

#[derive(Debug, SurrealValue)]
struct CityCostRowWithId {
    record_id: String,
    tenant_id: String,
    city: String,
    uf: String,
    category: String,
    amount: String,
    reference_date: String,
    created_at: DateTime<Utc>,
}

impl CityCostRowWithId {
    fn try_into_city_cost(self) -> Result<CityBaseCost, DbError> {
        Ok(CityBaseCost {
            id: decode::uuid(TABLE, "id", &self.record_id)?,
            tenant_id: decode::uuid(TABLE, "tenant_id", &self.tenant_id)?,
            city: self.city,
            uf: self.uf,
            category: decode::variant(
                TABLE,
                "category",
                &self.category,
                TransactionCategory::parse,
            )?,
            amount: decode::money(TABLE, "amount", &self.amount)?,
            reference_date: decode::date(TABLE, "reference_date", &self.reference_date)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the reference cost table.
#[derive(Clone)]
pub struct SurrealCityCostRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCityCostRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn scoped(&self, ctx: &TenantContext) -> TenantScoped<'_, C> {
        TenantScoped::new(&self.db, TABLE, ctx)
    }
}

impl<C: Connection> CityCostRepository for SurrealCityCostRepository<C> {
    async fn create(
        &self,
        ctx: &TenantContext,
        input: CreateCityBaseCost,
    ) -> ShowdeskResult<CityBaseCost> {
        let id = Uuid::new_v4();
        let content = json!({
            "city": input.city,
            "uf": input.uf,
            "category": input.category.as_str(),
            "amount": input.amount.to_string(),
            "reference_date": decode::format_date(input.reference_date),
        });

        let row: CityCostRowWithId = self.scoped(ctx).create(id, content).await?;
        let cost = row.try_into_city_cost()?;
        info!(
            tenant_id = %ctx.tenant_id(),
            city = %cost.city,
            uf = %cost.uf,
            category = cost.category.as_str(),
            "Reference cost recorded"
        );
        Ok(cost)
    }

    async fn list(
        &self,
        ctx: &TenantContext,
        filter: CityCostFilter,
        pagination: Pagination,
    ) -> ShowdeskResult<PaginatedResult<CityBaseCost>> {
        let filter = Filter::new()
            .eq_opt("city", filter.city)
            .eq_opt("uf", filter.uf.map(|uf| uf.to_ascii_uppercase()))
            .eq_opt("category", filter.category.map(|c| c.as_str()));
        let scoped = self.scoped(ctx);

        let total = scoped.count(&filter).await?;
        let rows: Vec<CityCostRowWithId> = scoped.list(&filter, &pagination).await?;
        let items = rows
            .into_iter()
            .map(CityCostRowWithId::try_into_city_cost)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<()> {
        self.scoped(ctx).delete(id).await?;
        info!(tenant_id = %ctx.tenant_id(), city_cost_id = %id, "Reference cost deleted");
        Ok(())
    }
}
