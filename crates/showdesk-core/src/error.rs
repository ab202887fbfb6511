//! Error types for the Showdesk system.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShowdeskError {
    /// The entity is absent or belongs to another tenant. The two cases
    /// are deliberately indistinguishable.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    /// Cost entry attempted before the show's contract was signed.
    #[error("Contract not signed: costs are locked until the contract is validated")]
    ContractNotSigned,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Permission denied: {capability} is required")]
    PermissionDenied { capability: String },

    #[error("Tenant subscription is suspended")]
    TenantSuspended,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ShowdeskResult<T> = Result<T, ShowdeskError>;

impl ShowdeskError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Stable, client-facing error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::ContractNotSigned => "CONTRACT_NOT_SIGNED",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::TenantSuspended => "TENANT_SUSPENDED",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this is a domain outcome the caller can act on, as opposed
    /// to an unanticipated failure.
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }

    /// Translate into the structured response handed to callers.
    ///
    /// Internal failures collapse into an opaque message; their detail is
    /// only attached when `expose_detail` is set (non-production modes).
    pub fn to_response(&self, expose_detail: bool) -> ErrorResponse {
        if self.is_domain() {
            return ErrorResponse {
                code: self.code(),
                message: self.to_string(),
                detail: None,
            };
        }
        ErrorResponse {
            code: self.code(),
            message: "An internal error occurred".into(),
            detail: expose_detail.then(|| self.to_string()),
        }
    }
}

/// User-facing structured error.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
