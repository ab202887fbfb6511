//! SurrealDB implementation of [`CheckinRepository`].

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::models::checkin::{CheckinBatch, CheckinOutcome, ShowCheckin};
use showdesk_core::repository::CheckinRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::decode;
use crate::repository::scoped::{Filter, TenantScoped};

pub(crate) const TABLE: &str = "show_checkin";

/// Two batches racing on the same user trip the unique index; the loser
/// re-reads and finds the user present.
const CHECKIN_ATTEMPTS: u32 = 3;
const UNIQUE_INDEX: &str = "idx_checkin_unique";

#[derive(Debug, SurrealValue)]
struct CheckinRowWithId {
    record_id: String,
    tenant_id: String,
    show_id: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl CheckinRowWithId {
    fn try_into_checkin(self) -> Result<ShowCheckin, DbError> {
        Ok(ShowCheckin {
            id: decode::uuid(TABLE, "id", &self.record_id)?,
            tenant_id: decode::uuid(TABLE, "tenant_id", &self.tenant_id)?,
            show_id: decode::uuid(TABLE, "show_id", &self.show_id)?,
            user_id: decode::uuid(TABLE, "user_id", &self.user_id)?,
            checked_in_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of crew check-in.
#[derive(Clone)]
pub struct SurrealCheckinRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCheckinRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn scoped(&self, ctx: &TenantContext) -> TenantScoped<'_, C> {
        TenantScoped::new(&self.db, TABLE, ctx)
    }

    /// One guarded call: returns the users that were already present.
    async fn apply(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
        entries: &[Value],
    ) -> Result<Vec<String>, DbError> {
        let result = self
            .db
            .query("RETURN fn::check_in($tenant_id, $show_id, $entries)")
            .bind(("tenant_id", ctx.tenant_id().to_string()))
            .bind(("show_id", show_id.to_string()))
            .bind(("entries", Value::from(entries.to_vec())))
            .await?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_guarded(e, TABLE, &show_id.to_string()))?;
        let present: Vec<String> = result.take(0)?;
        Ok(present)
    }
}

impl<C: Connection> CheckinRepository for SurrealCheckinRepository<C> {
    async fn check_in(
        &self,
        ctx: &TenantContext,
        batch: CheckinBatch,
    ) -> ShowdeskResult<CheckinOutcome> {
        let users = batch.distinct_users();
        let entries: Vec<Value> = users
            .iter()
            .map(|user_id| {
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "user_id": user_id.to_string(),
                })
            })
            .collect();

        let mut attempt = 1;
        let present = loop {
            match self.apply(ctx, batch.show_id, &entries).await {
                Ok(present) => break present,
                Err(DbError::Query(text))
                    if attempt < CHECKIN_ATTEMPTS
                        && (text.contains(UNIQUE_INDEX) || DbError::is_conflict(&text)) =>
                {
                    debug!(show_id = %batch.show_id, attempt, "Check-in raced; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let fresh = users
            .iter()
            .filter(|user_id| !present.contains(&user_id.to_string()))
            .count();
        let outcome = CheckinOutcome::new(batch.show_id, batch.user_ids.len(), fresh);
        info!(
            tenant_id = %ctx.tenant_id(),
            show_id = %batch.show_id,
            checked_in = outcome.checked_in,
            already_checked = outcome.already_checked,
            "Crew checked in"
        );
        Ok(outcome)
    }

    async fn list_by_show(
        &self,
        ctx: &TenantContext,
        show_id: Uuid,
    ) -> ShowdeskResult<Vec<ShowCheckin>> {
        let filter = Filter::new().eq("show_id", show_id.to_string());
        let rows: Vec<CheckinRowWithId> = self.scoped(ctx).list_all(&filter).await?;
        Ok(rows
            .into_iter()
            .map(CheckinRowWithId::try_into_checkin)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
