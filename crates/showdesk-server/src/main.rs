//! Showdesk Server — Application entry point.

mod config;

use showdesk_db::repository::{
    SurrealCheckinRepository, SurrealCityCostRepository, SurrealCommissionRepository,
    SurrealCostHistory,
    SurrealLedgerRepository, SurrealSettlementReader, SurrealShowRepository,
    SurrealTenantResolver,
};
use showdesk_db::{DbError, DbManager};
use showdesk_finance::{
    Boundary, CheckinService, CommissionService, LedgerService, SettlementService, ShowService,
    ViabilityService,
};
use surrealdb::engine::any::Any;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

use crate::config::{AppConfig, ConfigError};

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("log filter: {0}")]
    LogFilter(#[from] ParseError),
    #[error("database connection: {0}")]
    Connect(#[from] surrealdb::Error),
    #[error("migrations: {0}")]
    Migrate(#[from] DbError),
    #[error("signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

/// Everything the request layer needs, built once at startup.
///
/// This is the hand-off point for the HTTP layer, which lives outside this
/// binary; until it is mounted the services are only constructed.
#[allow(dead_code)]
struct App {
    resolver: SurrealTenantResolver<Any>,
    shows: ShowService<SurrealShowRepository<Any>>,
    ledger: LedgerService<SurrealLedgerRepository<Any>, SurrealShowRepository<Any>>,
    commissions: CommissionService<SurrealCommissionRepository<Any>, SurrealShowRepository<Any>>,
    checkins: CheckinService<SurrealCheckinRepository<Any>, SurrealShowRepository<Any>>,
    settlement: SettlementService<SurrealSettlementReader<Any>>,
    viability: ViabilityService<SurrealCostHistory<Any>, SurrealCityCostRepository<Any>>,
    boundary: Boundary,
}

impl App {
    fn wire(db: &DbManager, config: &AppConfig) -> Self {
        let client = db.client().clone();
        let shows = SurrealShowRepository::new(client.clone());
        Self {
            resolver: SurrealTenantResolver::new(client.clone()),
            shows: ShowService::new(shows.clone(), config.finance.clone()),
            ledger: LedgerService::new(SurrealLedgerRepository::new(client.clone()), shows.clone()),
            commissions: CommissionService::new(
                SurrealCommissionRepository::new(client.clone()),
                shows.clone(),
            ),
            checkins: CheckinService::new(SurrealCheckinRepository::new(client.clone()), shows),
            settlement: SettlementService::new(SurrealSettlementReader::new(client.clone())),
            viability: ViabilityService::new(
                SurrealCostHistory::new(client.clone()),
                SurrealCityCostRepository::new(client),
                config.finance.clone(),
            ),
            boundary: Boundary::new(config.environment.exposes_error_detail()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("showdesk=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting Showdesk server...");

    let config = AppConfig::from_env()?;
    tracing::info!(environment = ?config.environment, "Configuration loaded");

    let db = DbManager::connect(&config.db).await?;
    showdesk_db::run_migrations(db.client()).await?;

    let _app = App::wire(&db, &config);
    tracing::info!(
        schema_version = showdesk_db::latest_version(),
        "Services ready"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Showdesk server stopped.");
    Ok(())
}
