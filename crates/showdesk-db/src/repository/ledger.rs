//! SurrealDB implementation of [`LedgerRepository`].

use chrono::{DateTime, Utc};
use serde_json::json;
use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::show::ShowStatus;
use showdesk_core::models::transaction::{
    Correction, FinancialTransaction, NewTransaction, TransactionCategory, TransactionType,
};
use showdesk_core::repository::LedgerRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::decode;
use crate::repository::scoped::{Filter, TenantScoped};

pub(crate) const TABLE: &str = "financial_transaction";

#[derive(Debug, SurrealValue)]
pub(crate) struct TransactionRowWithId {
    record_id: String,
    tenant_id: String,
    show_id: String,
    transaction_type: String,
    category: String,
    description: Option<String>,
    budgeted_amount: String,
    realized_amount: String,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRowWithId {
    pub(crate) fn try_into_transaction(self) -> Result<FinancialTransaction, DbError> {
        Ok(FinancialTransaction {
            id: decode::uuid(TABLE, "id", &self.record_id)?,
            tenant_id: decode::uuid(TABLE, "tenant_id", &self.tenant_id)?,
            show_id: decode::uuid(TABLE, "show_id", &self.show_id)?,
            transaction_type: decode::variant(
                TABLE,
                "transaction_type",
                &self.transaction_type,
                TransactionType::parse,
            )?,
            category: decode::variant(
                TABLE,
                "category",
                &self.category,
                TransactionCategory::parse,
            )?,
            description: self.description,
            budgeted_amount: decode::money(TABLE, "budgeted_amount", &self.budgeted_amount)?,
            realized_amount: decode::money(TABLE, "realized_amount", &self.realized_amount)?,
            created_by: decode::uuid(TABLE, "created_by", &self.created_by)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the financial ledger.
#[derive(Clone)]
pub struct SurrealLedgerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLedgerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn scoped(&self, ctx: &TenantContext) -> TenantScoped<'_, C> {
        TenantScoped::new(&self.db, TABLE, ctx)
    }
}

impl<C: Connection> LedgerRepository for SurrealLedgerRepository<C> {
    async fn append(
        &self,
        ctx: &TenantContext,
        input: NewTransaction,
    ) -> ShowdeskResult<FinancialTransaction> {
        let id = Uuid::new_v4();
        let gated = input.transaction_type.is_cost();
        let locked = ShowStatus::COST_LOCKED.map(|s| s.as_str());
        let content = json!({
            "transaction_type": input.transaction_type.as_str(),
            "category": input.category.as_str(),
            "description": input.description,
            "budgeted_amount": input.budgeted_amount.to_string(),
            "realized_amount": input.realized_amount.to_string(),
            "created_by": ctx.user_id().to_string(),
        });

        let row: TransactionRowWithId = match self
            .scoped(ctx)
            .create_for_show(id, input.show_id, gated, &locked, content)
            .await
        {
            Ok(row) => row,
            Err(DbError::ContractNotSigned) => {
                warn!(
                    tenant_id = %ctx.tenant_id(),
                    show_id = %input.show_id,
                    transaction_type = input.transaction_type.as_str(),
                    "Cost entry rejected: contract not signed"
                );
                return Err(DbError::ContractNotSigned.into());
            }
            Err(e) => return Err(e.into()),
        };

        let entry = row.try_into_transaction()?;
        info!(
            tenant_id = %ctx.tenant_id(),
            show_id = %entry.show_id,
            transaction_id = %entry.id,
            transaction_type = entry.transaction_type.as_str(),
            realized = %entry.realized_amount,
            "Ledger entry appended"
        );
        Ok(entry)
    }

    async fn get(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<FinancialTransaction> {
        let row: TransactionRowWithId = self.scoped(ctx).get(id).await?;
        Ok(row.try_into_transaction()?)
    }

    async fn list_by_show(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> ShowdeskResult<Vec<FinancialTransaction>> {
        let filter = Filter::new().eq("show_id", show_id.to_string());
        let rows: Vec<TransactionRowWithId> = self.scoped(ctx).list_all(&filter).await?;
        Ok(rows
            .into_iter()
            .map(TransactionRowWithId::try_into_transaction)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn count_by_show(&self, ctx: &TenantContext, show_id: Uuid) -> ShowdeskResult<u64> {
        let filter = Filter::new().eq("show_id", show_id.to_string());
        Ok(self.scoped(ctx).count(&filter).await?)
    }

    async fn correct(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        correction: Correction,
    ) -> ShowdeskResult<FinancialTransaction> {
        let patch = json!({
            "realized_amount": correction.realized_amount.map(|v| v.to_string()),
            "description": correction.description,
        });

        let row: TransactionRowWithId = self.scoped(ctx).merge(id, patch).await?;
        let entry = row.try_into_transaction()?;
        info!(
            tenant_id = %ctx.tenant_id(),
            transaction_id = %id,
            realized = %entry.realized_amount,
            "Ledger entry corrected"
        );
        Ok(entry)
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<()> {
        self.scoped(ctx).delete_from_show(id).await?;
        info!(tenant_id = %ctx.tenant_id(), transaction_id = %id, "Ledger entry deleted");
        Ok(())
    }
}
