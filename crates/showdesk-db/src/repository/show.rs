//! SurrealDB implementation of [`ShowRepository`].
//!
//! Lifecycle and detail writes are compare-and-set on the row's `version`
//! column: the `UPDATE` only matches while the stored version equals the
//! one the caller read, and bumps it in the same statement.

use chrono::{DateTime, Utc};
use serde_json::json;
use showdesk_core::context::TenantContext;
use showdesk_core::error::ShowdeskResult;
use showdesk_core::lifecycle::{ContractValidation, Lifecycle};
use showdesk_core::models::show::{ClientType, CreateShow, NegotiationType, Show, ShowStatus};
use showdesk_core::repository::{PaginatedResult, Pagination, ShowFilter, ShowRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::decode;
use crate::repository::scoped::{Filter, TenantScoped};

pub(crate) const TABLE: &str = "show";

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct ShowRowWithId {
    record_id: String,
    tenant_id: String,
    artist_id: String,
    contractor_id: Option<String>,
    venue_id: Option<String>,
    client_type: String,
    negotiation_type: String,
    show_date: String,
    city: String,
    uf: String,
    face_value: String,
    real_cache: String,
    production_kickback: String,
    tax_percentage: String,
    notes: Option<String>,
    status: String,
    contract_validated_at: Option<DateTime<Utc>>,
    contract_validated_by: Option<String>,
    road_closed_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ShowRowWithId {
    pub(crate) fn try_into_show(self) -> Result<Show, DbError> {
        let contract = match (self.contract_validated_at, self.contract_validated_by) {
            (Some(validated_at), Some(by)) => Some(ContractValidation {
                validated_at,
                validated_by: decode::uuid(TABLE, "contract_validated_by", &by)?,
            }),
            (None, None) => None,
            _ => {
                return Err(DbError::decode(
                    TABLE,
                    "contract validation timestamp and actor must be set together",
                ));
            }
        };
        let lifecycle = Lifecycle {
            status: decode::variant(TABLE, "status", &self.status, ShowStatus::parse)?,
            contract,
            road_closed_at: self.road_closed_at,
        };
        lifecycle
            .check_consistency()
            .map_err(|e| DbError::decode(TABLE, e.to_string()))?;

        Ok(Show {
            id: decode::uuid(TABLE, "id", &self.record_id)?,
            tenant_id: decode::uuid(TABLE, "tenant_id", &self.tenant_id)?,
            artist_id: decode::uuid(TABLE, "artist_id", &self.artist_id)?,
            contractor_id: decode::opt_uuid(TABLE, "contractor_id", self.contractor_id.as_deref())?,
            venue_id: decode::opt_uuid(TABLE, "venue_id", self.venue_id.as_deref())?,
            client_type: decode::variant(
                TABLE,
                "client_type",
                &self.client_type,
                ClientType::parse,
            )?,
            negotiation_type: decode::variant(
                TABLE,
                "negotiation_type",
                &self.negotiation_type,
                NegotiationType::parse,
            )?,
            show_date: decode::date(TABLE, "show_date", &self.show_date)?,
            city: self.city,
            uf: self.uf,
            face_value: decode::money(TABLE, "face_value", &self.face_value)?,
            real_cache: decode::money(TABLE, "real_cache", &self.real_cache)?,
            production_kickback: decode::money(
                TABLE,
                "production_kickback",
                &self.production_kickback,
            )?,
            tax_percentage: decode::money(TABLE, "tax_percentage", &self.tax_percentage)?,
            notes: self.notes,
            lifecycle,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Only used to learn whether a compare-and-set matched.
#[derive(Debug, SurrealValue)]
struct VersionRow {
    #[allow(dead_code)]
    version: u64,
}

/// SurrealDB implementation of the Show repository.
#[derive(Clone)]
pub struct SurrealShowRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealShowRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn scoped(&self, ctx: &TenantContext) -> TenantScoped<'_, C> {
        TenantScoped::new(&self.db, TABLE, ctx)
    }

    /// Run a version-guarded `UPDATE`. Returns whether it matched a row.
    /// A write conflict reported by the datastore counts as a lost race.
    async fn compare_and_set(
        &self,
        query: String,
        binds: Vec<(&'static str, serde_json::Value)>,
        datetimes: Vec<(&'static str, DateTime<Utc>)>,
    ) -> Result<bool, DbError> {
        let mut builder = self.db.query(query);
        for bind in binds {
            builder = builder.bind(bind);
        }
        for bind in datetimes {
            builder = builder.bind(bind);
        }

        let result = match builder.await {
            Ok(result) => result,
            Err(e) if DbError::is_conflict(&e) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let mut result = match result.check() {
            Ok(result) => result,
            Err(e) if DbError::is_conflict(&e) => return Ok(false),
            Err(e) => return Err(DbError::Query(e.to_string())),
        };
        let rows: Vec<VersionRow> = result.take(0)?;
        Ok(!rows.is_empty())
    }
}

fn opt_set(sets: &mut Vec<String>, field: &str, present: bool) {
    if present {
        sets.push(format!("{field} = ${field}"));
    } else {
        sets.push(format!("{field} = NONE"));
    }
}

impl<C: Connection> ShowRepository for SurrealShowRepository<C> {
    async fn create(&self, ctx: &TenantContext, input: CreateShow) -> ShowdeskResult<Show> {
        let id = Uuid::new_v4();
        let content = json!({
            "artist_id": input.artist_id.to_string(),
            "contractor_id": input.contractor_id.map(|v| v.to_string()),
            "venue_id": input.venue_id.map(|v| v.to_string()),
            "client_type": input.client_type.as_str(),
            "negotiation_type": input.negotiation_type.as_str(),
            "show_date": decode::format_date(input.show_date),
            "city": input.city,
            "uf": input.uf,
            "face_value": input.face_value.to_string(),
            "real_cache": input.real_cache.to_string(),
            "production_kickback": input.production_kickback.to_string(),
            "tax_percentage": input.tax_percentage.to_string(),
            "notes": input.notes,
            "status": ShowStatus::Prospect.as_str(),
            "version": 0,
        });

        let row: ShowRowWithId = self.scoped(ctx).create(id, content).await?;
        let show = row.try_into_show()?;
        info!(tenant_id = %ctx.tenant_id(), show_id = %show.id, "Show created");
        Ok(show)
    }

    async fn get(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<Show> {
        let row: ShowRowWithId = self.scoped(ctx).get(id).await?;
        Ok(row.try_into_show()?)
    }

    async fn list(
        &self,
        ctx: &TenantContext,
        filter: ShowFilter,
        pagination: Pagination,
    ) -> ShowdeskResult<PaginatedResult<Show>> {
        let filter = Filter::new().eq_opt("status", filter.status.map(|s| s.as_str()));
        let scoped = self.scoped(ctx);

        let total = scoped.count(&filter).await?;
        let rows: Vec<ShowRowWithId> = scoped.list(&filter, &pagination).await?;
        let items = rows
            .into_iter()
            .map(ShowRowWithId::try_into_show)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count(&self, ctx: &TenantContext) -> ShowdeskResult<u64> {
        Ok(self.scoped(ctx).count(&Filter::new()).await?)
    }

    async fn update_details(&self, ctx: &TenantContext, next: &Show) -> ShowdeskResult<Option<Show>> {
        let mut sets: Vec<String> = [
            "client_type",
            "negotiation_type",
            "show_date",
            "city",
            "uf",
            "face_value",
            "real_cache",
            "production_kickback",
            "tax_percentage",
        ]
        .iter()
        .map(|field| format!("{field} = ${field}"))
        .collect();
        opt_set(&mut sets, "contractor_id", next.contractor_id.is_some());
        opt_set(&mut sets, "venue_id", next.venue_id.is_some());
        opt_set(&mut sets, "notes", next.notes.is_some());
        sets.push("version = version + 1".into());

        let query = format!(
            "UPDATE type::record('{TABLE}', $id) SET {} \
             WHERE tenant_id = $tenant_id AND version = $expected_version \
             RETURN AFTER",
            sets.join(", ")
        );

        let mut binds: Vec<(&'static str, serde_json::Value)> = vec![
            ("id", json!(next.id.to_string())),
            ("tenant_id", json!(ctx.tenant_id().to_string())),
            ("expected_version", json!(next.version)),
            ("client_type", json!(next.client_type.as_str())),
            ("negotiation_type", json!(next.negotiation_type.as_str())),
            ("show_date", json!(decode::format_date(next.show_date))),
            ("city", json!(next.city)),
            ("uf", json!(next.uf)),
            ("face_value", json!(next.face_value.to_string())),
            ("real_cache", json!(next.real_cache.to_string())),
            ("production_kickback", json!(next.production_kickback.to_string())),
            ("tax_percentage", json!(next.tax_percentage.to_string())),
        ];
        if let Some(contractor_id) = next.contractor_id {
            binds.push(("contractor_id", json!(contractor_id.to_string())));
        }
        if let Some(venue_id) = next.venue_id {
            binds.push(("venue_id", json!(venue_id.to_string())));
        }
        if let Some(notes) = &next.notes {
            binds.push(("notes", json!(notes)));
        }

        if !self.compare_and_set(query, binds, Vec::new()).await? {
            debug!(show_id = %next.id, expected_version = next.version, "Show update lost race");
            return Ok(None);
        }
        Ok(Some(self.get(ctx, next.id).await?))
    }

    async fn transition(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        expected_version: u64,
        next: Lifecycle,
    ) -> ShowdeskResult<Option<Show>> {
        let mut sets = vec!["status = $status".to_string()];
        opt_set(&mut sets, "contract_validated_at", next.contract.is_some());
        opt_set(&mut sets, "contract_validated_by", next.contract.is_some());
        opt_set(&mut sets, "road_closed_at", next.road_closed_at.is_some());
        sets.push("version = version + 1".into());

        let query = format!(
            "UPDATE type::record('{TABLE}', $id) SET {} \
             WHERE tenant_id = $tenant_id AND version = $expected_version \
             RETURN AFTER",
            sets.join(", ")
        );

        let mut binds: Vec<(&'static str, serde_json::Value)> = vec![
            ("id", json!(id.to_string())),
            ("tenant_id", json!(ctx.tenant_id().to_string())),
            ("expected_version", json!(expected_version)),
            ("status", json!(next.status.as_str())),
        ];
        let mut datetimes = Vec::new();
        if let Some(contract) = next.contract {
            datetimes.push(("contract_validated_at", contract.validated_at));
            binds.push((
                "contract_validated_by",
                json!(contract.validated_by.to_string()),
            ));
        }
        if let Some(closed_at) = next.road_closed_at {
            datetimes.push(("road_closed_at", closed_at));
        }

        if !self.compare_and_set(query, binds, datetimes).await? {
            debug!(show_id = %id, expected_version, "Show transition lost race");
            return Ok(None);
        }
        Ok(Some(self.get(ctx, id).await?))
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> ShowdeskResult<()> {
        let result = self
            .db
            .query("RETURN fn::delete_show($tenant_id, $id)")
            .bind(("tenant_id", ctx.tenant_id().to_string()))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::from_guarded(e, TABLE, &id.to_string()))?;

        info!(tenant_id = %ctx.tenant_id(), show_id = %id, "Show deleted");
        Ok(())
    }
}
