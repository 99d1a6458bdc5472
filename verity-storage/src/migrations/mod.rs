//! Schema migrations, applied in order and tracked in `schema_migrations`.

pub mod v001_core_tables;
pub mod v002_bookkeeping_tables;

use rusqlite::Connection;

use verity_core::errors::VerityResult;

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> VerityResult<()>;

const MIGRATIONS: &[(u32, MigrationFn)] = &[
    (1, v001_core_tables::migrate),
    (2, v002_bookkeeping_tables::migrate),
];

pub fn run_migrations(conn: &Connection) -> VerityResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL)",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    for (version, migrate) in MIGRATIONS {
        let applied: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        if applied {
            continue;
        }
        migrate(conn)?;
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            [version],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}
