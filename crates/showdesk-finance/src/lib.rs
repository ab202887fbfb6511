//! Showdesk Finance — the DRE profit waterfall, the viability projector
//! and the services that orchestrate show lifecycle, ledger, commission
//! and crew check-in operations over the repository traits.

pub mod boundary;
pub mod checkin;
pub mod commissions;
pub mod config;
pub mod dre;
pub mod error;
pub mod ledger;
pub mod settlement;
pub mod shows;
pub mod viability;

pub use boundary::Boundary;
pub use checkin::CheckinService;
pub use commissions::CommissionService;
pub use config::FinanceConfig;
pub use dre::{CommissionLine, DreResult, compute_dre};
pub use error::FinanceError;
pub use ledger::{ExtraExpense, LedgerService};
pub use settlement::SettlementService;
pub use shows::{ContractValidated, RoadClosed, ShowService};
pub use viability::{
    CostSource, SimulationInput, SimulationResult, Verdict, ViabilityService,
};
