//! Show lifecycle state machine.
//!
//! `status` is the single gate. Contract validation and road closing are
//! recorded as metadata of the transitions that produce them, so the
//! following always hold for any [`Lifecycle`] built through this module:
//!
//! - `contract.is_some()` if and only if `status >= Signed`
//! - `road_closed_at.is_some()` implies `status >= OnTheRoad`
//! - `status == Completed` implies `road_closed_at.is_some()`
//!
//! Every transition is a pure function from one lifecycle value to the
//! next; persisting the result atomically is the repository's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ShowdeskError, ShowdeskResult};
use crate::models::show::ShowStatus;

/// Who validated the contract, and when.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractValidation {
    pub validated_at: DateTime<Utc>,
    pub validated_by: Uuid,
}

/// Label attached to a DRE result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Consolidation {
    /// Road closed: the numbers are final.
    Consolidated,
    Provisional,
}

impl Consolidation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consolidated => "CONSOLIDATED",
            Self::Provisional => "PROVISIONAL",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lifecycle {
    pub status: ShowStatus,
    pub contract: Option<ContractValidation>,
    pub road_closed_at: Option<DateTime<Utc>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::initial()
    }
}

impl Lifecycle {
    pub fn initial() -> Self {
        Self {
            status: ShowStatus::Prospect,
            contract: None,
            road_closed_at: None,
        }
    }

    /// Whether cost-type ledger entries may be written right now.
    pub fn accepts_costs(&self) -> bool {
        self.status.accepts_costs()
    }

    pub fn is_consolidated(&self) -> bool {
        self.road_closed_at.is_some()
    }

    pub fn consolidation(&self) -> Consolidation {
        if self.is_consolidated() {
            Consolidation::Consolidated
        } else {
            Consolidation::Provisional
        }
    }

    /// Check the invariants listed in the module docs. Used when loading
    /// persisted rows, which may have been written by other tools.
    pub fn check_consistency(&self) -> ShowdeskResult<()> {
        let signed = self.status >= ShowStatus::Signed;
        if signed != self.contract.is_some() {
            return Err(ShowdeskError::Internal(format!(
                "lifecycle inconsistent: status {} with contract validation {}",
                self.status.as_str(),
                if self.contract.is_some() { "present" } else { "absent" },
            )));
        }
        if self.road_closed_at.is_some() && self.status < ShowStatus::OnTheRoad {
            return Err(ShowdeskError::Internal(format!(
                "lifecycle inconsistent: road closed while {}",
                self.status.as_str()
            )));
        }
        if self.status == ShowStatus::Completed && self.road_closed_at.is_none() {
            return Err(ShowdeskError::Internal(
                "lifecycle inconsistent: completed without closing the road".into(),
            ));
        }
        Ok(())
    }

    /// Validate the contract: records the actor and moves the show to
    /// `Signed`. Only legal while the contract phase is still open.
    pub fn validate_contract(&self, actor: Uuid, at: DateTime<Utc>) -> ShowdeskResult<Self> {
        if self.contract.is_some() || self.status >= ShowStatus::Signed {
            return Err(ShowdeskError::invalid_state(format!(
                "contract already validated (status {})",
                self.status.as_str()
            )));
        }
        Ok(Self {
            status: ShowStatus::Signed,
            contract: Some(ContractValidation {
                validated_at: at,
                validated_by: actor,
            }),
            road_closed_at: None,
        })
    }

    /// Move forward to `target` along the allowed graph.
    ///
    /// `Signed` is not a valid target here; it is only reachable through
    /// [`Lifecycle::validate_contract`].
    pub fn advance(&self, target: ShowStatus) -> ShowdeskResult<Self> {
        use ShowStatus::{
            Completed, ContractPending, OnTheRoad, PreProduction, Proposal, Prospect, Signed,
        };

        if target <= self.status {
            return Err(ShowdeskError::invalid_state(format!(
                "cannot move from {} back to {}",
                self.status.as_str(),
                target.as_str()
            )));
        }
        let allowed = matches!(
            (self.status, target),
            (Prospect, Proposal)
                | (Prospect, ContractPending)
                | (Proposal, ContractPending)
                | (Signed, PreProduction)
                | (PreProduction, OnTheRoad)
                | (OnTheRoad, Completed)
        );
        if target == Signed {
            return Err(ShowdeskError::invalid_state(
                "a show becomes signed only when its contract is validated",
            ));
        }
        if !allowed {
            return Err(ShowdeskError::invalid_state(format!(
                "transition {} -> {} is not allowed",
                self.status.as_str(),
                target.as_str()
            )));
        }
        if target == Completed && self.road_closed_at.is_none() {
            return Err(ShowdeskError::invalid_state(
                "the road must be closed before the show is completed",
            ));
        }
        Ok(Self {
            status: target,
            ..*self
        })
    }

    /// Close the road. Only legal while exactly `OnTheRoad`, once.
    pub fn close_road(&self, at: DateTime<Utc>) -> ShowdeskResult<Self> {
        if self.status != ShowStatus::OnTheRoad {
            return Err(ShowdeskError::invalid_state(format!(
                "road can only be closed while on the road (status {})",
                self.status.as_str()
            )));
        }
        if self.road_closed_at.is_some() {
            return Err(ShowdeskError::invalid_state("road already closed"));
        }
        Ok(Self {
            road_closed_at: Some(at),
            ..*self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::show::ShowStatus::*;

    fn on_the_road() -> Lifecycle {
        Lifecycle::initial()
            .validate_contract(Uuid::new_v4(), Utc::now())
            .and_then(|l| l.advance(PreProduction))
            .and_then(|l| l.advance(OnTheRoad))
            .unwrap()
    }

    #[test]
    fn initial_is_locked_and_provisional() {
        let lc = Lifecycle::initial();
        assert_eq!(lc.status, Prospect);
        assert!(!lc.accepts_costs());
        assert_eq!(lc.consolidation(), Consolidation::Provisional);
        lc.check_consistency().unwrap();
    }

    #[test]
    fn contract_validation_unlocks_costs() {
        let actor = Uuid::new_v4();
        let at = Utc::now();
        let lc = Lifecycle::initial()
            .advance(ContractPending)
            .unwrap()
            .validate_contract(actor, at)
            .unwrap();
        assert_eq!(lc.status, Signed);
        assert!(lc.accepts_costs());
        assert_eq!(
            lc.contract,
            Some(ContractValidation {
                validated_at: at,
                validated_by: actor
            })
        );
        lc.check_consistency().unwrap();
    }

    #[test]
    fn contract_validation_is_set_once() {
        let lc = Lifecycle::initial()
            .validate_contract(Uuid::new_v4(), Utc::now())
            .unwrap();
        let err = lc.validate_contract(Uuid::new_v4(), Utc::now()).unwrap_err();
        assert!(matches!(err, ShowdeskError::InvalidState { .. }));
        let err = on_the_road().validate_contract(Uuid::new_v4(), Utc::now());
        assert!(err.is_err());
    }

    #[test]
    fn signed_not_reachable_by_advance() {
        let err = Lifecycle::initial().advance(Signed).unwrap_err();
        assert!(matches!(err, ShowdeskError::InvalidState { .. }));
        let pending = Lifecycle::initial().advance(ContractPending).unwrap();
        assert!(pending.advance(Signed).is_err());
        assert!(pending.advance(PreProduction).is_err());
    }

    #[test]
    fn backward_and_skipping_transitions_rejected() {
        let lc = on_the_road();
        assert!(lc.advance(PreProduction).is_err());
        assert!(lc.advance(Prospect).is_err());
        assert!(lc.advance(OnTheRoad).is_err());

        let signed = Lifecycle::initial()
            .validate_contract(Uuid::new_v4(), Utc::now())
            .unwrap();
        assert!(signed.advance(OnTheRoad).is_err());
    }

    #[test]
    fn close_road_only_on_the_road() {
        for lc in [
            Lifecycle::initial(),
            Lifecycle::initial()
                .validate_contract(Uuid::new_v4(), Utc::now())
                .unwrap(),
        ] {
            let err = lc.close_road(Utc::now()).unwrap_err();
            assert!(matches!(err, ShowdeskError::InvalidState { .. }));
        }

        let closed = on_the_road().close_road(Utc::now()).unwrap();
        assert!(closed.is_consolidated());
        assert_eq!(closed.consolidation().as_str(), "CONSOLIDATED");
        assert!(closed.close_road(Utc::now()).is_err());
    }

    #[test]
    fn completion_requires_closed_road() {
        let lc = on_the_road();
        assert!(lc.advance(Completed).is_err());
        let done = lc.close_road(Utc::now()).unwrap().advance(Completed).unwrap();
        assert_eq!(done.status, Completed);
        assert!(done.is_consolidated());
        done.check_consistency().unwrap();
        assert!(done.close_road(Utc::now()).is_err());
    }

    #[test]
    fn consistency_catches_divergent_gates() {
        let manual = Lifecycle {
            status: PreProduction,
            contract: None,
            road_closed_at: None,
        };
        assert!(manual.check_consistency().is_err());

        let early_close = Lifecycle {
            status: Signed,
            contract: Some(ContractValidation {
                validated_at: Utc::now(),
                validated_by: Uuid::new_v4(),
            }),
            road_closed_at: Some(Utc::now()),
        };
        assert!(early_close.check_consistency().is_err());
    }
}
