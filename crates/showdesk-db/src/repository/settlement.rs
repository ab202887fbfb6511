//! Consistent reads for the profit waterfall.

use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::repository::{SettlementReader, SettlementSnapshot};
use surrealdb::{Connection, Surreal};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::commission::CommissionRowWithId;
use crate::repository::ledger::TransactionRowWithId;
use crate::repository::show::ShowRowWithId;

/// Reads a show, its ledger and its commissions inside one transaction.
#[derive(Clone)]
pub struct SurrealSettlementReader<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSettlementReader<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SettlementReader for SurrealSettlementReader<C> {
    async fn snapshot(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> ShowdeskResult<SettlementSnapshot> {
        let show_id_str = show_id.to_string();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('show', $show_id) \
                 WHERE tenant_id = $tenant_id; \
                 SELECT meta::id(id) AS record_id, * FROM financial_transaction \
                 WHERE tenant_id = $tenant_id AND show_id = $show_id \
                 ORDER BY created_at ASC; \
                 SELECT meta::id(id) AS record_id, * FROM commission \
                 WHERE tenant_id = $tenant_id AND show_id = $show_id \
                 ORDER BY created_at ASC; \
                 COMMIT TRANSACTION;",
            )
            .bind(("tenant_id", ctx.tenant_id().to_string()))
            .bind(("show_id", show_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let shows: Vec<ShowRowWithId> = result.take(0).map_err(DbError::from)?;
        let show = shows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "show".into(),
                id: show_id_str,
            })?
            .try_into_show()?;

        let transactions: Vec<TransactionRowWithId> = result.take(1).map_err(DbError::from)?;
        let transactions = transactions
            .into_iter()
            .map(TransactionRowWithId::try_into_transaction)
            .collect::<Result<Vec<_>, DbError>>()?;

        let commissions: Vec<CommissionRowWithId> = result.take(2).map_err(DbError::from)?;
        let commissions = commissions
            .into_iter()
            .map(CommissionRowWithId::try_into_commission)
            .collect::<Result<Vec<_>, DbError>>()?;

        debug!(
            tenant_id = %ctx.tenant_id(),
            %show_id,
            transactions = transactions.len(),
            commissions = commissions.len(),
            "Settlement snapshot read"
        );

        Ok(SettlementSnapshot {
            show,
            transactions,
            commissions,
        })
    }
}
