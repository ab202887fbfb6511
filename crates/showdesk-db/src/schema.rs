//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Monetary amounts are stored as
//! canonical decimal strings and calendar dates as `YYYY-MM-DD` strings.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "cost_history_indexes",
        sql: SCHEMA_V2,
    },
    Migration {
        version: 3,
        name: "crew_checkin",
        sql: SCHEMA_V3,
    },
];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD document ON TABLE tenant TYPE option<string>;
DEFINE FIELD status ON TABLE tenant TYPE string \
    ASSERT $value IN ['Active', 'Suspended', 'Trial'];
DEFINE FIELD subscription_expires_at ON TABLE tenant \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    VALUE time::now();

-- =======================================================================
-- Shows (tenant scope)
-- =======================================================================
DEFINE TABLE show SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE show TYPE string;
DEFINE FIELD artist_id ON TABLE show TYPE string;
DEFINE FIELD contractor_id ON TABLE show TYPE option<string>;
DEFINE FIELD venue_id ON TABLE show TYPE option<string>;
DEFINE FIELD client_type ON TABLE show TYPE string \
    ASSERT $value IN ['Private', 'Public'];
DEFINE FIELD negotiation_type ON TABLE show TYPE string \
    ASSERT $value IN ['FeePlusExpenses', 'AllInclusive', \
    'FeePlusAirfare', 'Custom'];
DEFINE FIELD show_date ON TABLE show TYPE string;
DEFINE FIELD city ON TABLE show TYPE string;
DEFINE FIELD uf ON TABLE show TYPE string;
DEFINE FIELD face_value ON TABLE show TYPE string;
DEFINE FIELD real_cache ON TABLE show TYPE string;
DEFINE FIELD production_kickback ON TABLE show TYPE string;
DEFINE FIELD tax_percentage ON TABLE show TYPE string;
DEFINE FIELD notes ON TABLE show TYPE option<string>;
DEFINE FIELD status ON TABLE show TYPE string \
    ASSERT $value IN ['Prospect', 'Proposal', 'ContractPending', \
    'Signed', 'PreProduction', 'OnTheRoad', 'Completed'];
DEFINE FIELD contract_validated_at ON TABLE show TYPE option<datetime>;
DEFINE FIELD contract_validated_by ON TABLE show TYPE option<string>;
DEFINE FIELD road_closed_at ON TABLE show TYPE option<datetime>;
DEFINE FIELD version ON TABLE show TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE show TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE show TYPE datetime \
    VALUE time::now();
DEFINE INDEX idx_show_tenant_status ON TABLE show \
    COLUMNS tenant_id, status;

-- =======================================================================
-- Financial transactions (tenant scope, keyed by show)
-- =======================================================================
DEFINE TABLE financial_transaction SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE financial_transaction TYPE string;
DEFINE FIELD show_id ON TABLE financial_transaction TYPE string;
DEFINE FIELD transaction_type ON TABLE financial_transaction TYPE string \
    ASSERT $value IN ['Revenue', 'ProductionCost', 'LogisticsCost', \
    'Tax', 'Commission', 'Kickback', 'ExtraExpense'];
DEFINE FIELD category ON TABLE financial_transaction TYPE string \
    ASSERT $value IN ['CrewPayment', 'Backline', 'SoundLight', 'Stage', \
    'Flight', 'Bus', 'Hotel', 'VanTransfer', 'Meals', 'TaxNf', \
    'Intermediary', 'Other'];
DEFINE FIELD description ON TABLE financial_transaction \
    TYPE option<string>;
DEFINE FIELD budgeted_amount ON TABLE financial_transaction TYPE string;
DEFINE FIELD realized_amount ON TABLE financial_transaction TYPE string;
DEFINE FIELD created_by ON TABLE financial_transaction TYPE string;
DEFINE FIELD created_at ON TABLE financial_transaction TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE financial_transaction TYPE datetime \
    VALUE time::now();
DEFINE INDEX idx_transaction_tenant_show ON TABLE financial_transaction \
    COLUMNS tenant_id, show_id;

-- =======================================================================
-- Commissions (tenant scope, keyed by show)
-- =======================================================================
DEFINE TABLE commission SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE commission TYPE string;
DEFINE FIELD show_id ON TABLE commission TYPE string;
DEFINE FIELD beneficiary_name ON TABLE commission TYPE string;
DEFINE FIELD beneficiary_user_id ON TABLE commission TYPE option<string>;
DEFINE FIELD basis ON TABLE commission TYPE string \
    ASSERT $value IN ['Gross', 'Net'];
DEFINE FIELD percentage ON TABLE commission TYPE string;
DEFINE FIELD created_at ON TABLE commission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_commission_tenant_show ON TABLE commission \
    COLUMNS tenant_id, show_id;

-- =======================================================================
-- City reference costs (tenant scope)
-- =======================================================================
DEFINE TABLE city_base_cost SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE city_base_cost TYPE string;
DEFINE FIELD city ON TABLE city_base_cost TYPE string;
DEFINE FIELD uf ON TABLE city_base_cost TYPE string;
DEFINE FIELD category ON TABLE city_base_cost TYPE string \
    ASSERT $value IN ['CrewPayment', 'Backline', 'SoundLight', 'Stage', \
    'Flight', 'Bus', 'Hotel', 'VanTransfer', 'Meals', 'TaxNf', \
    'Intermediary', 'Other'];
DEFINE FIELD amount ON TABLE city_base_cost TYPE string;
DEFINE FIELD reference_date ON TABLE city_base_cost TYPE string;
DEFINE FIELD created_at ON TABLE city_base_cost TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Guarded writes. Each call is a single statement, so the show check
-- and the write it authorizes commit or fail together.
-- =======================================================================
DEFINE FUNCTION fn::append_to_show($table: string, $tenant_id: string, \
    $show_id: string, $id: string, $gated: bool, \
    $locked_statuses: array<string>, $content: object) { \
    LET $show = (SELECT status FROM type::record('show', $show_id) \
        WHERE tenant_id = $tenant_id)[0]; \
    IF $show = NONE { THROW 'showdesk:show_not_found'; }; \
    IF $gated AND $show.status IN $locked_statuses { \
        THROW 'showdesk:contract_not_signed'; \
    }; \
    CREATE type::record($table, $id) CONTENT $content RETURN NONE; \
    RETURN $id; \
};
DEFINE FUNCTION fn::delete_from_show($table: string, $tenant_id: string, \
    $id: string) { \
    LET $entry = (SELECT show_id FROM type::record($table, $id) \
        WHERE tenant_id = $tenant_id)[0]; \
    IF $entry = NONE { THROW 'showdesk:entry_not_found'; }; \
    LET $show = (SELECT road_closed_at FROM type::record('show', $entry.show_id) \
        WHERE tenant_id = $tenant_id)[0]; \
    IF $show != NONE AND $show.road_closed_at != NONE { \
        THROW 'showdesk:road_closed'; \
    }; \
    DELETE type::record($table, $id) WHERE tenant_id = $tenant_id; \
    RETURN $id; \
};
DEFINE FUNCTION fn::delete_show($tenant_id: string, $id: string) { \
    LET $show = (SELECT road_closed_at FROM type::record('show', $id) \
        WHERE tenant_id = $tenant_id)[0]; \
    IF $show = NONE { THROW 'showdesk:show_not_found'; }; \
    IF $show.road_closed_at != NONE { THROW 'showdesk:road_closed'; }; \
    DELETE financial_transaction \
        WHERE tenant_id = $tenant_id AND show_id = $id; \
    DELETE commission WHERE tenant_id = $tenant_id AND show_id = $id; \
    DELETE type::record('show', $id) WHERE tenant_id = $tenant_id; \
    RETURN $id; \
};
";

// -----------------------------------------------------------------------
// Schema v2: lookups used by the viability projector
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
DEFINE INDEX idx_show_tenant_city ON TABLE show \
    COLUMNS tenant_id, uf, city, show_date;
DEFINE INDEX idx_transaction_tenant_category ON TABLE financial_transaction \
    COLUMNS tenant_id, category;
DEFINE INDEX idx_city_cost_lookup ON TABLE city_base_cost \
    COLUMNS tenant_id, uf, city, category, reference_date;
";

// -----------------------------------------------------------------------
// Schema v3: crew presence check-in
// -----------------------------------------------------------------------

const SCHEMA_V3: &str = "\
DEFINE TABLE show_checkin SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE show_checkin TYPE string;
DEFINE FIELD show_id ON TABLE show_checkin TYPE string;
DEFINE FIELD user_id ON TABLE show_checkin TYPE string;
DEFINE FIELD created_at ON TABLE show_checkin TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_checkin_unique ON TABLE show_checkin \
    COLUMNS tenant_id, show_id, user_id UNIQUE;

-- Creates the entries whose user is not checked in yet and returns the
-- users that already were.
DEFINE FUNCTION fn::check_in($tenant_id: string, $show_id: string, \
    $entries: array<object>) { \
    LET $show = (SELECT road_closed_at FROM type::record('show', $show_id) \
        WHERE tenant_id = $tenant_id)[0]; \
    IF $show = NONE { THROW 'showdesk:show_not_found'; }; \
    IF $show.road_closed_at != NONE { THROW 'showdesk:road_closed'; }; \
    LET $present = (SELECT VALUE user_id FROM show_checkin \
        WHERE tenant_id = $tenant_id AND show_id = $show_id); \
    FOR $entry IN $entries { \
        IF $entry.user_id NOT IN $present { \
            CREATE type::record('show_checkin', $entry.id) CONTENT { \
                tenant_id: $tenant_id, \
                show_id: $show_id, \
                user_id: $entry.user_id \
            } RETURN NONE; \
        }; \
    }; \
    RETURN $present; \
};
DEFINE FUNCTION OVERWRITE fn::delete_show($tenant_id: string, $id: string) { \
    LET $show = (SELECT road_closed_at FROM type::record('show', $id) \
        WHERE tenant_id = $tenant_id)[0]; \
    IF $show = NONE { THROW 'showdesk:show_not_found'; }; \
    IF $show.road_closed_at != NONE { THROW 'showdesk:road_closed'; }; \
    DELETE financial_transaction \
        WHERE tenant_id = $tenant_id AND show_id = $id; \
    DELETE commission WHERE tenant_id = $tenant_id AND show_id = $id; \
    DELETE show_checkin WHERE tenant_id = $tenant_id AND show_id = $id; \
    DELETE type::record('show', $id) WHERE tenant_id = $tenant_id; \
    RETURN $id; \
};
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Highest schema version known to this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}
