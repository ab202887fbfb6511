//! SurrealDB implementation of [`TenantRepository`] and the tenant
//! resolver built on it.

use chrono::{DateTime, Utc};
use showdesk_core::context::{Actor, TenantContext, TenantResolver, VerifiedIdentity};
use showdesk_core::error::{ShowdeskError, ShowdeskResult};
use showdesk_core::models::tenant::{CreateTenant, Tenant, TenantStatus};
use showdesk_core::repository::{PaginatedResult, Pagination, TenantRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::decode;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    name: String,
    document: Option<String>,
    status: String,
    subscription_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: decode::uuid("tenant", "id", &self.record_id)?,
            name: self.name,
            document: self.document,
            status: decode::variant("tenant", "status", &self.status, TenantStatus::parse)?,
            subscription_expires_at: self.subscription_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Tenant, DbError> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('tenant', $id)")
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<TenantRowWithId> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        row.try_into_tenant()
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> ShowdeskResult<Tenant> {
        let id = Uuid::new_v4();
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ShowdeskError::validation("tenant name must not be empty"));
        }
        let status = input.status.unwrap_or(TenantStatus::Trial);

        let mut sets = vec!["name = $name", "status = $status"];
        if input.document.is_some() {
            sets.push("document = $document");
        }
        if input.subscription_expires_at.is_some() {
            sets.push("subscription_expires_at = $expires_at");
        }
        let query = format!(
            "CREATE type::record('tenant', $id) SET {} RETURN NONE",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("name", name))
            .bind(("status", status.as_str().to_string()));
        if let Some(document) = input.document {
            builder = builder.bind(("document", document));
        }
        if let Some(expires_at) = input.subscription_expires_at {
            builder = builder.bind(("expires_at", expires_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        result.check().map_err(|e| DbError::Query(e.to_string()))?;

        info!(tenant_id = %id, status = status.as_str(), "Tenant created");
        Ok(self.fetch(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> ShowdeskResult<Tenant> {
        Ok(self.fetch(id).await?)
    }

    async fn list(&self, pagination: Pagination) -> ShowdeskResult<PaginatedResult<Tenant>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM tenant GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn set_subscription(
        &self,
        id: Uuid,
        status: TenantStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> ShowdeskResult<Tenant> {
        let query = if expires_at.is_some() {
            "UPDATE type::record('tenant', $id) SET status = $status, \
             subscription_expires_at = $expires_at RETURN NONE"
        } else {
            "UPDATE type::record('tenant', $id) SET status = $status, \
             subscription_expires_at = NONE RETURN NONE"
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("status", status.as_str().to_string()));
        if let Some(expires_at) = expires_at {
            builder = builder.bind(("expires_at", expires_at));
        }
        let result = builder.await.map_err(DbError::from)?;
        result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let tenant = self.fetch(id).await?;
        info!(
            tenant_id = %id,
            status = status.as_str(),
            expires_at = ?tenant.subscription_expires_at,
            "Tenant subscription changed"
        );
        Ok(tenant)
    }
}

/// Resolves verified identities against stored tenants.
#[derive(Clone)]
pub struct SurrealTenantResolver<C: Connection> {
    tenants: SurrealTenantRepository<C>,
}

impl<C: Connection> SurrealTenantResolver<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            tenants: SurrealTenantRepository::new(db),
        }
    }
}

impl<C: Connection> TenantResolver for SurrealTenantResolver<C> {
    async fn resolve(&self, identity: &VerifiedIdentity) -> ShowdeskResult<TenantContext> {
        let tenant = self.tenants.get_by_id(identity.tenant_id).await?;
        if !tenant.is_usable_at(Utc::now()) {
            warn!(
                tenant_id = %tenant.id,
                status = tenant.status.as_str(),
                "Rejected request for unusable tenant"
            );
            return Err(ShowdeskError::TenantSuspended);
        }
        Ok(TenantContext::new(
            tenant.id,
            Actor {
                user_id: identity.user_id,
                role: identity.role.clone(),
            },
        ))
    }
}
