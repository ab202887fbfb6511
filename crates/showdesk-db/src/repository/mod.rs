//! SurrealDB repository implementations.

mod checkin;
mod city_cost;
mod commission;
mod decode;
mod history;
mod ledger;
mod scoped;
mod settlement;
mod show;
mod tenant;

pub use checkin::SurrealCheckinRepository;
pub use city_cost::SurrealCityCostRepository;
pub use commission::SurrealCommissionRepository;
pub use history::SurrealCostHistory;
pub use ledger::SurrealLedgerRepository;
pub use settlement::SurrealSettlementReader;
pub use show::SurrealShowRepository;
pub use tenant::{SurrealTenantRepository, SurrealTenantResolver};
