//! Crew presence check-in.
//!
//! Any member of the tenant may submit a batch; devices sync offline and
//! resend, so a user already present is counted and skipped.

use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::checkin::{CheckinBatch, CheckinOutcome, ShowCheckin};
use showdesk_core::repository::{CheckinRepository, ShowRepository};
use uuid::Uuid;

pub struct CheckinService<K: CheckinRepository, S: ShowRepository> {
    checkins: K,
    shows: S,
}

impl<K: CheckinRepository, S: ShowRepository> CheckinService<K, S> {
    pub fn new(checkins: K, shows: S) -> Self {
        Self { checkins, shows }
    }

    /// Record a batch. Rejected with `InvalidState` once the road is
    /// closed.
    pub async fn check_in(
        &self,
        ctx: &TenantContext,
        batch: CheckinBatch,
    ) -> ShowdeskResult<CheckinOutcome> {
        self.checkins.check_in(ctx, batch.validated()?).await
    }

    pub async fn list(&self, ctx: &TenantContext, show_id: Uuid) -> ShowdeskResult<Vec<ShowCheckin>> {
        self.shows.get(ctx, show_id).await?;
        self.checkins.list_by_show(ctx, show_id).await
    }
}
