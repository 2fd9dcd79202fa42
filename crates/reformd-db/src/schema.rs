//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. Signups are keyed by their normalized email,
//! both as the record ID and through a unique index, so the store's
//! own key conflict resolution serializes concurrent upserts.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

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
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "waitlist_signup",
    sql: SCHEMA_V1,
}];

const SCHEMA_V1: &str = "\
DEFINE TABLE signup SCHEMAFULL;
DEFINE FIELD email ON TABLE signup TYPE string;

-- Profile
DEFINE FIELD full_name ON TABLE signup TYPE option<string>;
DEFINE FIELD age_bracket ON TABLE signup TYPE option<string>;
DEFINE FIELD gender ON TABLE signup TYPE option<string>;
DEFINE FIELD goal ON TABLE signup TYPE option<string>;
DEFINE FIELD biggest_issue ON TABLE signup TYPE option<string>;
DEFINE FIELD timeframe ON TABLE signup TYPE option<string>;
DEFINE FIELD notes ON TABLE signup TYPE option<string>;

-- Attribution
DEFINE FIELD source ON TABLE signup TYPE option<string>;
DEFINE FIELD landing_url ON TABLE signup TYPE option<string>;
DEFINE FIELD referrer ON TABLE signup TYPE option<string>;
DEFINE FIELD utm_source ON TABLE signup TYPE option<string>;
DEFINE FIELD utm_medium ON TABLE signup TYPE option<string>;
DEFINE FIELD utm_campaign ON TABLE signup TYPE option<string>;
DEFINE FIELD utm_content ON TABLE signup TYPE option<string>;
DEFINE FIELD utm_term ON TABLE signup TYPE option<string>;

-- Verification
DEFINE FIELD verification_token_digest ON TABLE signup TYPE option<string>;
DEFINE FIELD verification_expires_at ON TABLE signup TYPE option<datetime>;
DEFINE FIELD verified_token_digest ON TABLE signup TYPE option<string>;
DEFINE FIELD verified_at ON TABLE signup TYPE option<datetime>;

DEFINE FIELD created_at ON TABLE signup TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE signup TYPE datetime \
    DEFAULT time::now();

DEFINE INDEX idx_signup_email ON TABLE signup COLUMNS email UNIQUE;
DEFINE INDEX idx_signup_token_digest ON TABLE signup \
    COLUMNS verification_token_digest;
DEFINE INDEX idx_signup_verified_digest ON TABLE signup \
    COLUMNS verified_token_digest;
";

/// Apply all pending migrations.
///
/// Creates the `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the recorded maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
    {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "recording v{} failed: {}",
                    migration.version, e,
                ))
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(window[0].version < window[1].version);
        }
    }

    #[test]
    fn schema_declares_unique_email() {
        assert!(SCHEMA_V1.contains("COLUMNS email UNIQUE"));
    }
}
