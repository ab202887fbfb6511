//! Finance error types.

use showdesk_core::error::ShowdeskError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("proposed cache must not be negative")]
    NegativeCache,

    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(String),

    #[error("{0} is not a cost type")]
    NotACost(&'static str),

    #[error("show {show_id} kept changing under concurrent writes")]
    WriteContention { show_id: Uuid },

    #[error("amount overflow while computing {0}")]
    Overflow(&'static str),
}

impl From<FinanceError> for ShowdeskError {
    fn from(err: FinanceError) -> Self {
        match err {
            FinanceError::NegativeCache
            | FinanceError::InvalidParameter(_)
            | FinanceError::NotACost(_) => ShowdeskError::Validation {
                message: err.to_string(),
            },
            FinanceError::WriteContention { .. } => ShowdeskError::InvalidState {
                reason: err.to_string(),
            },
            FinanceError::Overflow(_) => ShowdeskError::Internal(err.to_string()),
        }
    }
}
