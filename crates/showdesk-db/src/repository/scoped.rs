//! Tenant-scoped table access.
//!
//! [`TenantScoped`] is how the repositories read and write tenant-scoped
//! tables. Every statement it issues carries `tenant_id = $tenant_id` as
//! its first predicate, taken from the caller's [`TenantContext`], so a
//! row owned by another tenant behaves exactly like a missing one.
//! Hand-written statements elsewhere in this crate bind the same
//! predicate from the same source.

use serde_json::{Map, Value};
use showdesk_core::context::TenantContext;
use showdesk_core::repository::Pagination;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

/// Equality predicates applied after the tenant predicate.
#[derive(Debug, Default)]
pub(crate) struct Filter {
    clauses: Vec<(&'static str, Value)>,
}

impl Filter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn eq(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.clauses.push((field, value.into()));
        self
    }

    pub(crate) fn eq_opt(self, field: &'static str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    fn where_clause(&self) -> String {
        let mut clause = String::from("tenant_id = $tenant_id");
        for (field, _) in &self.clauses {
            clause.push_str(&format!(" AND {field} = $filter_{field}"));
        }
        clause
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct DeletedRow {
    #[allow(dead_code)]
    tenant_id: String,
}

/// A single table seen through one tenant.
pub(crate) struct TenantScoped<'a, C: Connection> {
    db: &'a Surreal<C>,
    table: &'static str,
    tenant_id: String,
}

impl<'a, C: Connection> TenantScoped<'a, C> {
    pub(crate) fn new(db: &'a Surreal<C>, table: &'static str, ctx: &TenantContext) -> Self {
        Self {
            db,
            table,
            tenant_id: ctx.tenant_id().to_string(),
        }
    }

    fn not_found(&self, id: impl ToString) -> DbError {
        DbError::NotFound {
            entity: self.table.into(),
            id: id.to_string(),
        }
    }

    /// Fetch one row by id. Rows are selected with `meta::id(id) AS
    /// record_id`.
    pub(crate) async fn get<R: SurrealValue>(&self, id: Uuid) -> Result<R, DbError> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM type::record('{}', $id) \
             WHERE tenant_id = $tenant_id",
            self.table
        );
        debug!(table = self.table, %id, "Scoped get");

        let mut result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", self.tenant_id.clone()))
            .await?;

        let rows: Vec<R> = result.take(0)?;
        rows.into_iter().next().ok_or_else(|| self.not_found(id))
    }

    /// One page of rows matching `filter`, oldest first.
    pub(crate) async fn list<R: SurrealValue>(
        &self,
        filter: &Filter,
        pagination: &Pagination,
    ) -> Result<Vec<R>, DbError> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM {} WHERE {} \
             ORDER BY created_at ASC LIMIT $limit START $offset",
            self.table,
            filter.where_clause()
        );
        let mut builder = self
            .db
            .query(query)
            .bind(("tenant_id", self.tenant_id.clone()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        for (field, value) in &filter.clauses {
            builder = builder.bind((format!("filter_{field}"), value.clone()));
        }

        let mut result = builder.await?;
        let rows: Vec<R> = result.take(0)?;
        Ok(rows)
    }

    /// Every row matching `filter`, in insertion order.
    pub(crate) async fn list_all<R: SurrealValue>(&self, filter: &Filter) -> Result<Vec<R>, DbError> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM {} WHERE {} \
             ORDER BY created_at ASC",
            self.table,
            filter.where_clause()
        );
        let mut builder = self
            .db
            .query(query)
            .bind(("tenant_id", self.tenant_id.clone()));
        for (field, value) in &filter.clauses {
            builder = builder.bind((format!("filter_{field}"), value.clone()));
        }

        let mut result = builder.await?;
        let rows: Vec<R> = result.take(0)?;
        Ok(rows)
    }

    pub(crate) async fn count(&self, filter: &Filter) -> Result<u64, DbError> {
        let query = format!(
            "SELECT count() AS total FROM {} WHERE {} GROUP ALL",
            self.table,
            filter.where_clause()
        );
        let mut builder = self
            .db
            .query(query)
            .bind(("tenant_id", self.tenant_id.clone()));
        for (field, value) in &filter.clauses {
            builder = builder.bind((format!("filter_{field}"), value.clone()));
        }

        let mut result = builder.await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    /// Create a row with the given content. `tenant_id` is always set from
    /// the context; absent optional fields are stored as `NONE`.
    pub(crate) async fn create<R: SurrealValue>(
        &self,
        id: Uuid,
        content: Value,
    ) -> Result<R, DbError> {
        let mut content = into_content(content)?;
        content.insert("tenant_id".into(), Value::String(self.tenant_id.clone()));

        let query = format!(
            "CREATE type::record('{table}', $id) CONTENT $content RETURN NONE; \
             SELECT meta::id(id) AS record_id, * FROM type::record('{table}', $id) \
             WHERE tenant_id = $tenant_id",
            table = self.table
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("content", Value::Object(content)))
            .bind(("tenant_id", self.tenant_id.clone()))
            .await?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<R> = result.take(1)?;
        rows.into_iter().next().ok_or_else(|| self.not_found(id))
    }

    /// Merge `patch` into an existing row. The tenant id cannot be patched.
    pub(crate) async fn merge<R: SurrealValue>(&self, id: Uuid, patch: Value) -> Result<R, DbError> {
        let mut patch = into_content(patch)?;
        patch.remove("tenant_id");

        let query = format!(
            "UPDATE type::record('{table}', $id) MERGE $patch \
             WHERE tenant_id = $tenant_id RETURN NONE; \
             SELECT meta::id(id) AS record_id, * FROM type::record('{table}', $id) \
             WHERE tenant_id = $tenant_id",
            table = self.table
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("patch", Value::Object(patch)))
            .bind(("tenant_id", self.tenant_id.clone()))
            .await?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<R> = result.take(1)?;
        rows.into_iter().next().ok_or_else(|| self.not_found(id))
    }

    /// Create a row that belongs to a show, checking in the same statement
    /// that the show exists in this tenant and, when `gated`, that its
    /// status is not one of `locked_statuses`.
    pub(crate) async fn create_for_show<R: SurrealValue>(
        &self,
        id: Uuid,
        show_id: Uuid,
        gated: bool,
        locked_statuses: &[&str],
        content: Value,
    ) -> Result<R, DbError> {
        let mut content = into_content(content)?;
        content.insert("tenant_id".into(), Value::String(self.tenant_id.clone()));
        content.insert("show_id".into(), Value::String(show_id.to_string()));

        let result = self
            .db
            .query(
                "RETURN fn::append_to_show($table, $tenant_id, $show_id, $id, \
                 $gated, $locked_statuses, $content)",
            )
            .bind(("table", self.table))
            .bind(("tenant_id", self.tenant_id.clone()))
            .bind(("show_id", show_id.to_string()))
            .bind(("id", id.to_string()))
            .bind(("gated", gated))
            .bind(("locked_statuses", Value::from(locked_statuses.to_vec())))
            .bind(("content", Value::Object(content)))
            .await?;
        result
            .check()
            .map_err(|e| DbError::from_guarded(e, self.table, &show_id.to_string()))?;

        self.get(id).await
    }

    /// Delete a row that belongs to a show, refusing once the show's road
    /// is closed.
    pub(crate) async fn delete_from_show(&self, id: Uuid) -> Result<(), DbError> {
        let result = self
            .db
            .query("RETURN fn::delete_from_show($table, $tenant_id, $id)")
            .bind(("table", self.table))
            .bind(("tenant_id", self.tenant_id.clone()))
            .bind(("id", id.to_string()))
            .await?;
        result
            .check()
            .map_err(|e| DbError::from_guarded(e, self.table, &id.to_string()))?;
        Ok(())
    }

    pub(crate) async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let query = format!(
            "DELETE type::record('{}', $id) WHERE tenant_id = $tenant_id RETURN BEFORE",
            self.table
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", self.tenant_id.clone()))
            .await?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DeletedRow> = result.take(0)?;
        if rows.is_empty() {
            return Err(self.not_found(id));
        }
        Ok(())
    }
}

/// Turn a JSON object into statement content, dropping `null` entries so
/// that `option<...>` fields end up `NONE`.
fn into_content(value: Value) -> Result<Map<String, Value>, DbError> {
    match value {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => Err(DbError::Query(format!("content must be an object, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tenant_predicate_comes_first() {
        let filter = Filter::new()
            .eq("show_id", "abc")
            .eq_opt("status", None::<String>)
            .eq_opt("category", Some("Hotel"));
        assert_eq!(
            filter.where_clause(),
            "tenant_id = $tenant_id AND show_id = $filter_show_id \
             AND category = $filter_category"
        );
    }

    #[test]
    fn content_drops_nulls() {
        let content = into_content(json!({"a": 1, "b": null, "c": "x"})).unwrap();
        assert_eq!(content.len(), 2);
        assert!(!content.contains_key("b"));
        assert!(into_content(json!([1, 2])).is_err());
    }
}
