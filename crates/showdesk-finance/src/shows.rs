//! Show management and lifecycle transitions.
//!
//! Every lifecycle write is version-guarded: the service reads the show,
//! applies the transition function from [`showdesk_core::lifecycle`] and
//! writes only if nobody else wrote in between. On a lost race it re-reads
//! and re-evaluates, so the loser sees the winner's state and fails the
//! gate check instead of overwriting it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use showdesk_core::context::TenantContext;
use showdesk_core::error::{ShowdeskError, ShowdeskResult};
use showdesk_core::lifecycle::Lifecycle;
use showdesk_core::models::capability::Capability;
use showdesk_core::models::show::{CreateShow, Show, ShowStatus, UpdateShow};
use showdesk_core::repository::{PaginatedResult, Pagination, ShowFilter, ShowRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::FinanceConfig;
use crate::error::FinanceError;

/// Result of validating a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractValidated {
    pub status: ShowStatus,
    pub validated_at: DateTime<Utc>,
    pub validated_by: Uuid,
}

/// Result of closing the road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoadClosed {
    pub closed_at: DateTime<Utc>,
}

/// Show service.
///
/// Generic over the repository so that the finance layer has no
/// dependency on the database crate.
pub struct ShowService<S: ShowRepository> {
    shows: S,
    config: FinanceConfig,
}

impl<S: ShowRepository> ShowService<S> {
    pub fn new(shows: S, config: FinanceConfig) -> Self {
        Self { shows, config }
    }

    pub async fn create(&self, ctx: &TenantContext, input: CreateShow) -> ShowdeskResult<Show> {
        ctx.require(Capability::CreateShows)?;
        self.shows.create(ctx, input.validated()?).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<Show> {
        self.shows.get(ctx, id).await
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: ShowFilter,
        pagination: Pagination,
    ) -> ShowdeskResult<PaginatedResult<Show>> {
        self.shows.list(ctx, filter, pagination).await
    }

    pub async fn count(&self, ctx: &TenantContext) -> ShowdeskResult<u64> {
        self.shows.count(ctx).await
    }

    /// Apply a patch to the show's editable fields.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: UpdateShow,
    ) -> ShowdeskResult<Show> {
        ctx.require(Capability::EditShows)?;
        for attempt in 1..=self.config.max_write_attempts {
            let current = self.shows.get(ctx, id).await?;
            let next = patch.clone().apply_to(&current)?;
            if let Some(show) = self.shows.update_details(ctx, &next).await? {
                info!(tenant_id = %ctx.tenant_id(), show_id = %id, "Show updated");
                return Ok(show);
            }
            debug!(show_id = %id, attempt, "Show changed during update; retrying");
        }
        Err(FinanceError::WriteContention { show_id: id }.into())
    }

    /// Move forward along the lifecycle graph. `Signed` is only reachable
    /// through [`ShowService::transition_contract`].
    pub async fn advance_status(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        target: ShowStatus,
    ) -> ShowdeskResult<Show> {
        ctx.require(Capability::EditShows)?;
        self.write_lifecycle(ctx, id, |lifecycle| lifecycle.advance(target))
            .await
    }

    /// Validate the show's contract, unlocking cost entry.
    pub async fn transition_contract(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> ShowdeskResult<ContractValidated> {
        ctx.require(Capability::ApproveContracts)?;
        let actor = ctx.user_id();
        let at = Utc::now();
        let show = self
            .write_lifecycle(ctx, id, |lifecycle| lifecycle.validate_contract(actor, at))
            .await?;

        let validation = show.lifecycle.contract.ok_or_else(|| {
            ShowdeskError::Internal(format!("show {id} signed without a contract validation"))
        })?;
        Ok(ContractValidated {
            status: show.status(),
            validated_at: validation.validated_at,
            validated_by: validation.validated_by,
        })
    }

    /// Close the road, which makes the show's DRE consolidated.
    pub async fn close_road(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<RoadClosed> {
        ctx.require(Capability::CloseRoad)?;
        let at = Utc::now();
        let show = self
            .write_lifecycle(ctx, id, |lifecycle| lifecycle.close_road(at))
            .await?;

        let closed_at = show.lifecycle.road_closed_at.ok_or_else(|| {
            ShowdeskError::Internal(format!("show {id} road close was not persisted"))
        })?;
        Ok(RoadClosed { closed_at })
    }

    /// Hard delete, together with the show's ledger, commissions and check-ins.
    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<()> {
        ctx.require(Capability::EditShows)?;
        self.shows.delete(ctx, id).await
    }

    async fn write_lifecycle<F>(&self, ctx: &TenantContext, id: Uuid, step: F) -> ShowdeskResult<Show>
    where
        F: Fn(&Lifecycle) -> ShowdeskResult<Lifecycle>,
    {
        for attempt in 1..=self.config.max_write_attempts {
            let current = self.shows.get(ctx, id).await?;
            let next = step(&current.lifecycle)?;
            if let Some(show) = self
                .shows
                .transition(ctx, id, current.version, next)
                .await?
            {
                info!(
                    tenant_id = %ctx.tenant_id(),
                    show_id = %id,
                    from = current.status().as_str(),
                    to = show.status().as_str(),
                    road_closed = show.road_closed(),
                    "Show lifecycle changed"
                );
                return Ok(show);
            }
            debug!(show_id = %id, attempt, "Show changed during transition; retrying");
        }
        Err(FinanceError::WriteContention { show_id: id }.into())
    }
}
