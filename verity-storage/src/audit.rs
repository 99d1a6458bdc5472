//! Append-only audit trail: every create/update/retract/resolve is attributable
//! even though the belief graph has no multi-tenant user model — `agent_id`
//! doubles as the actor.

use rusqlite::{params, Connection};

use verity_core::errors::VerityResult;

use crate::to_storage_err;

pub struct AuditLogger;

impl AuditLogger {
    pub fn log(conn: &Connection, actor: &str, operation: &str, memory_id: &str) -> VerityResult<()> {
        conn.execute(
            "INSERT INTO audit_log (actor, operation, memory_id, created_at)
             VALUES (?1, ?2, ?3, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            params![actor, operation, memory_id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(())
    }

    /// Entries older than `keep_months` months, rolled into a monthly count so
    /// the table doesn't grow unbounded on a long-lived deployment.
    pub fn rotate(conn: &Connection, keep_months: u32) -> VerityResult<usize> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(30 * keep_months as i64);
        let rows = conn
            .execute("DELETE FROM audit_log WHERE created_at <= ?1", params![cutoff.to_rfc3339()])
            .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(rows)
    }
}
