//! SurrealDB implementation of [`CommissionRepository`].

use chrono::{DateTime, Utc};
use serde_json::json;
use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::commission::{Commission, CommissionBasis, CreateCommission};
use showdesk_core::repository::CommissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::decode;
use crate::repository::scoped::{Filter, TenantScoped};

pub(crate) const TABLE: &str = "commission";

#[derive(Debug, SurrealValue)]
pub(crate) struct CommissionRowWithId {
    record_id: String,
    tenant_id: String,
    show_id: String,
    beneficiary_name: String,
    beneficiary_user_id: Option<String>,
    basis: String,
    percentage: String,
    created_at: DateTime<Utc>,
}

impl CommissionRowWithId {
    pub(crate) fn try_into_commission(self) -> Result<Commission, DbError> {
        Ok(Commission {
            id: decode::uuid(TABLE, "id", &self.record_id)?,
            tenant_id: decode::uuid(TABLE, "tenant_id", &self.tenant_id)?,
            show_id: decode::uuid(TABLE, "show_id", &self.show_id)?,
            beneficiary_name: self.beneficiary_name,
            beneficiary_user_id: decode::opt_uuid(
                TABLE,
                "beneficiary_user_id",
                self.beneficiary_user_id.as_deref(),
            )?,
            basis: decode::variant(TABLE, "basis", &self.basis, CommissionBasis::parse)?,
            percentage: decode::money(TABLE, "percentage", &self.percentage)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the commission registry.
#[derive(Clone)]
pub struct SurrealCommissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCommissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn scoped(&self, ctx: &TenantContext) -> TenantScoped<'_, C> {
        TenantScoped::new(&self.db, TABLE, ctx)
    }
}

impl<C: Connection> CommissionRepository for SurrealCommissionRepository<C> {
    async fn append(
        &self,
        ctx: &TenantContext,
        input: CreateCommission,
    ) -> ShowdeskResult<Commission> {
        let id = Uuid::new_v4();
        let content = json!({
            "beneficiary_name": input.beneficiary_name,
            "beneficiary_user_id": input.beneficiary_user_id.map(|u| u.to_string()),
            "basis": input.basis.as_str(),
            "percentage": input.percentage.to_string(),
        });

        let row: CommissionRowWithId = self
            .scoped(ctx)
            .create_for_show(id, input.show_id, false, &[], content)
            .await?;
        let commission = row.try_into_commission()?;
        info!(
            tenant_id = %ctx.tenant_id(),
            show_id = %commission.show_id,
            commission_id = %commission.id,
            basis = commission.basis.as_str(),
            percentage = %commission.percentage,
            "Commission registered"
        );
        Ok(commission)
    }

    async fn list_by_show(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> ShowdeskResult<Vec<Commission>> {
        let filter = Filter::new().eq("show_id", show_id.to_string());
        let rows: Vec<CommissionRowWithId> = self.scoped(ctx).list_all(&filter).await?;
        Ok(rows
            .into_iter()
            .map(CommissionRowWithId::try_into_commission)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<()> {
        self.scoped(ctx).delete_from_show(id).await?;
        info!(tenant_id = %ctx.tenant_id(), commission_id = %id, "Commission deleted");
        Ok(())
    }
}
