//! Capability tags and roles.
//!
//! Authorization is a closed set of capabilities evaluated by
//! [`Role::allows`]. The all-capabilities administrator is an explicit
//! variant, never a flag hidden inside a permission map.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewFinancials,
    ViewDre,
    ManageCommissions,
    /// Validates contracts, which unlocks cost entry.
    ApproveContracts,
    CreateShows,
    EditShows,
    AddExpenses,
    /// On-the-road expenses recorded by the crew.
    AddExtraExpenses,
    CloseRoad,
    SimulateShows,
    ManageCostHistory,
}

impl Capability {
    pub const ALL: [Capability; 11] = [
        Self::ViewFinancials,
        Self::ViewDre,
        Self::ManageCommissions,
        Self::ApproveContracts,
        Self::CreateShows,
        Self::EditShows,
        Self::AddExpenses,
        Self::AddExtraExpenses,
        Self::CloseRoad,
        Self::SimulateShows,
        Self::ManageCostHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewFinancials => "view_financials",
            Self::ViewDre => "view_dre",
            Self::ManageCommissions => "manage_commissions",
            Self::ApproveContracts => "approve_contracts",
            Self::CreateShows => "create_shows",
            Self::EditShows => "edit_shows",
            Self::AddExpenses => "add_expenses",
            Self::AddExtraExpenses => "add_extra_expenses",
            Self::CloseRoad => "close_road",
            Self::SimulateShows => "simulate_shows",
            Self::ManageCostHistory => "manage_cost_history",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role an actor holds inside its tenant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "capabilities", rename_all = "snake_case")]
pub enum Role {
    /// Holds every capability.
    Administrator,
    Member(BTreeSet<Capability>),
}

impl Role {
    pub fn member(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self::Member(capabilities.into_iter().collect())
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Self::Administrator => true,
            Self::Member(granted) => granted.contains(&capability),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_allows_everything() {
        for cap in Capability::ALL {
            assert!(Role::Administrator.allows(cap));
        }
    }

    #[test]
    fn member_allows_only_granted() {
        let role = Role::member([Capability::ViewDre, Capability::CloseRoad]);
        assert!(role.allows(Capability::ViewDre));
        assert!(role.allows(Capability::CloseRoad));
        assert!(!role.allows(Capability::ApproveContracts));
    }

    #[test]
    fn empty_member_allows_nothing() {
        let role = Role::Member(BTreeSet::new());
        assert!(Capability::ALL.iter().all(|c| !role.allows(*c)));
    }
}
