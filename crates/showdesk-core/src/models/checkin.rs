//! Crew presence check-in, recorded on the road before it is closed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ShowdeskError, ShowdeskResult};

/// One crew member's presence at a show.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowCheckin {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub show_id: Uuid,
    pub user_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
}

/// A batch of user ids, as synced from an offline device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinBatch {
    pub show_id: Uuid,
    pub user_ids: Vec<Uuid>,
}

impl CheckinBatch {
    pub fn validated(self) -> ShowdeskResult<Self> {
        if self.user_ids.is_empty() {
            return Err(ShowdeskError::validation("user_ids must not be empty"));
        }
        Ok(self)
    }

    /// The batch's user ids without repeats.
    pub fn distinct_users(&self) -> BTreeSet<Uuid> {
        self.user_ids.iter().copied().collect()
    }
}

/// How a batch landed. Every submitted id is counted exactly once, so
/// `checked_in + already_checked` equals the batch length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckinOutcome {
    pub show_id: Uuid,
    pub checked_in: u64,
    pub already_checked: u64,
}

impl CheckinOutcome {
    pub fn new(show_id: Uuid, submitted: usize, checked_in: usize) -> Self {
        Self {
            show_id,
            checked_in: checked_in as u64,
            already_checked: submitted.saturating_sub(checked_in) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_rejected() {
        let batch = CheckinBatch {
            show_id: Uuid::new_v4(),
            user_ids: Vec::new(),
        };
        assert_eq!(batch.validated().unwrap_err().code(), "VALIDATION_ERROR");
    }

    #[test]
    fn repeats_inside_a_batch_count_as_already_checked() {
        let user = Uuid::new_v4();
        let batch = CheckinBatch {
            show_id: Uuid::new_v4(),
            user_ids: vec![user, Uuid::new_v4(), user],
        };
        let distinct = batch.distinct_users();
        assert_eq!(distinct.len(), 2);

        let outcome = CheckinOutcome::new(batch.show_id, batch.user_ids.len(), distinct.len());
        assert_eq!(outcome.checked_in, 2);
        assert_eq!(outcome.already_checked, 1);
    }
}
