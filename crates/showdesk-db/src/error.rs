//! Database-specific error types and conversions.

use showdesk_core::error::ShowdeskError;

/// Markers raised with `THROW` by guarded write transactions. The first
/// marker found in the error text decides the domain error.
pub(crate) const THROW_SHOW_NOT_FOUND: &str = "showdesk:show_not_found";
pub(crate) const THROW_ENTRY_NOT_FOUND: &str = "showdesk:entry_not_found";
pub(crate) const THROW_CONTRACT_NOT_SIGNED: &str = "showdesk:contract_not_signed";
pub(crate) const THROW_ROAD_CLOSED: &str = "showdesk:road_closed";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A stored value could not be turned back into its domain type.
    #[error("Corrupt {entity} row: {message}")]
    Decode { entity: &'static str, message: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Contract not signed")]
    ContractNotSigned,
}

impl DbError {
    pub(crate) fn decode(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            entity,
            message: message.into(),
        }
    }

    /// Translate the failure of a guarded transaction. `THROW` markers
    /// become domain errors; anything else stays a query failure.
    pub(crate) fn from_guarded(err: impl std::fmt::Display, entity: &str, id: &str) -> Self {
        let text = err.to_string();
        if text.contains(THROW_CONTRACT_NOT_SIGNED) {
            Self::ContractNotSigned
        } else if text.contains(THROW_SHOW_NOT_FOUND) {
            Self::NotFound {
                entity: "show".into(),
                id: id.into(),
            }
        } else if text.contains(THROW_ENTRY_NOT_FOUND) {
            Self::NotFound {
                entity: entity.into(),
                id: id.into(),
            }
        } else if text.contains(THROW_ROAD_CLOSED) {
            Self::InvalidState("the road is closed; the show's books are consolidated".into())
        } else {
            Self::Query(text)
        }
    }

    /// Optimistic transactions that lost a write race.
    pub(crate) fn is_conflict(err: &impl std::fmt::Display) -> bool {
        let text = err.to_string().to_ascii_lowercase();
        text.contains("conflict") || text.contains("can be retried")
    }
}

impl From<DbError> for ShowdeskError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ShowdeskError::NotFound { entity, id },
            DbError::InvalidState(reason) => ShowdeskError::InvalidState { reason },
            DbError::ContractNotSigned => ShowdeskError::ContractNotSigned,
            other => ShowdeskError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrown_markers_map_to_domain_errors() {
        let err = DbError::from_guarded(
            format!("An error occurred: {THROW_CONTRACT_NOT_SIGNED}"),
            "financial_transaction",
            "abc",
        );
        assert!(matches!(
            ShowdeskError::from(err),
            ShowdeskError::ContractNotSigned
        ));

        let err = DbError::from_guarded(THROW_SHOW_NOT_FOUND, "commission", "s1");
        match ShowdeskError::from(err) {
            ShowdeskError::NotFound { entity, id } => {
                assert_eq!(entity, "show");
                assert_eq!(id, "s1");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = DbError::from_guarded(THROW_ROAD_CLOSED, "commission", "c1");
        assert!(matches!(
            ShowdeskError::from(err),
            ShowdeskError::InvalidState { .. }
        ));
    }

    #[test]
    fn unknown_failures_stay_opaque() {
        let err = DbError::from_guarded("parse error near line 3", "show", "x");
        assert!(matches!(
            ShowdeskError::from(err),
            ShowdeskError::Database(_)
        ));
    }
}
