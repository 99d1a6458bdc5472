//! v002: memory_versions, access_events, memory_events, system_stats, notifications.

use rusqlite::Connection;

use verity_core::errors::VerityResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> VerityResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memory_versions (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id        TEXT NOT NULL,
            version_number   INTEGER NOT NULL,
            change_type      TEXT NOT NULL,
            content_snapshot TEXT NOT NULL,
            change_reason    TEXT,
            session_id       TEXT,
            request_id       TEXT,
            created_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_versions_entity ON memory_versions(entity_id, version_number);

        CREATE TABLE IF NOT EXISTS access_events (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id    TEXT NOT NULL,
            access_type  TEXT NOT NULL,
            session_id   TEXT,
            query_text   TEXT,
            result_rank  INTEGER,
            similarity   REAL,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_access_entity ON access_events(entity_id, created_at);

        CREATE TABLE IF NOT EXISTS memory_events (
            id             TEXT PRIMARY KEY,
            session_id     TEXT NOT NULL,
            event_type     TEXT NOT NULL,
            memory_id      TEXT NOT NULL,
            violated_by    TEXT,
            damage_level   TEXT,
            context        TEXT NOT NULL DEFAULT '{}',
            created_at     TEXT NOT NULL,
            dispatched     INTEGER NOT NULL DEFAULT 0,
            dispatched_at  TEXT,
            workflow_id    TEXT,
            claimed_at     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_events_session ON memory_events(session_id, dispatched);
        CREATE INDEX IF NOT EXISTS idx_events_claimed ON memory_events(claimed_at, dispatched);

        CREATE TABLE IF NOT EXISTS system_stats (
            key   TEXT PRIMARY KEY,
            value REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id                 TEXT PRIMARY KEY,
            notification_type  TEXT NOT NULL,
            memory_id          TEXT NOT NULL,
            content            TEXT NOT NULL,
            context            TEXT NOT NULL DEFAULT '{}',
            read               INTEGER NOT NULL DEFAULT 0,
            created_at         TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_read ON notifications(read);

        CREATE TABLE IF NOT EXISTS audit_log (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            actor      TEXT NOT NULL,
            operation  TEXT NOT NULL,
            memory_id  TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_memory ON audit_log(memory_id, created_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
