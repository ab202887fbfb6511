//! Commission registry service.

use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::capability::Capability;
use showdesk_core::models::commission::{Commission, CreateCommission};
use showdesk_core::repository::{CommissionRepository, ShowRepository};
use uuid::Uuid;

pub struct CommissionService<C: CommissionRepository, S: ShowRepository> {
    commissions: C,
    shows: S,
}

impl<C: CommissionRepository, S: ShowRepository> CommissionService<C, S> {
    pub fn new(commissions: C, shows: S) -> Self {
        Self { commissions, shows }
    }

    pub async fn append(
        &self,
        ctx: &TenantContext,
        input: CreateCommission,
    ) -> ShowdeskResult<Commission> {
        ctx.require(Capability::ManageCommissions)?;
        self.commissions.append(ctx, input.validated()?).await
    }

    pub async fn list(&self, ctx: &TenantContext, show_id: Uuid) -> ShowdeskResult<Vec<Commission>> {
        ctx.require(Capability::ViewFinancials)?;
        self.shows.get(ctx, show_id).await?;
        self.commissions.list_by_show(ctx, show_id).await
    }

    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<()> {
        ctx.require(Capability::ManageCommissions)?;
        self.commissions.delete(ctx, id).await
    }
}
