//! On-demand DRE computation over a consistent snapshot.

use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::capability::Capability;
use showdesk_core::repository::SettlementReader;
use tracing::debug;
use uuid::Uuid;

use crate::dre::{DreResult, compute_dre};

pub struct SettlementService<R: SettlementReader> {
    reader: R,
}

impl<R: SettlementReader> SettlementService<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Recompute the show's waterfall from its current ledger and
    /// commissions.
    pub async fn compute_dre(&self, ctx: &TenantContext, show_id: Uuid) -> ShowdeskResult<DreResult> {
        ctx.require(Capability::ViewDre)?;
        let snapshot = self.reader.snapshot(ctx, show_id).await?;
        let dre = compute_dre(&snapshot.show, &snapshot.transactions, &snapshot.commissions)?;
        debug!(
            tenant_id = %ctx.tenant_id(),
            %show_id,
            final_result = %dre.final_result,
            consolidation = dre.consolidation.as_str(),
            "DRE computed"
        );
        Ok(dre)
    }
}
