//! Core domain types for Showdesk: tenants, shows and their lifecycle, the
//! financial ledger, commissions and the repository traits the storage
//! layer implements.

pub mod context;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod money;
pub mod repository;

pub use context::{Actor, TenantContext, TenantResolver, VerifiedIdentity};
pub use error::{ErrorResponse, ShowdeskError, ShowdeskResult};
pub use lifecycle::{Consolidation, ContractValidation, Lifecycle};
