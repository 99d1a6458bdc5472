//! Append-only version snapshots and history lookup.

use rusqlite::{params, Connection};

use verity_core::errors::VerityResult;
use verity_core::models::{ChangeType, VersionSnapshot};

use crate::to_storage_err;

pub fn insert_version(conn: &Connection, snapshot: &VersionSnapshot) -> VerityResult<()> {
    let change_type = serde_json::to_string(&snapshot.change_type)
        .map(|s| s.trim_matches('"').to_string())
        .map_err(|e| to_storage_err(e.to_string()))?;
    let content_snapshot =
        serde_json::to_string(&snapshot.content_snapshot).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO memory_versions
            (entity_id, version_number, change_type, content_snapshot, change_reason, session_id, request_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            snapshot.entity_id,
            snapshot.version_number,
            change_type,
            content_snapshot,
            snapshot.change_reason,
            snapshot.session_id,
            snapshot.request_id,
            snapshot.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn history(conn: &Connection, entity_id: &str) -> VerityResult<Vec<VersionSnapshot>> {
    let mut stmt = conn
        .prepare(
            "SELECT entity_id, version_number, change_type, content_snapshot, change_reason,
                    session_id, request_id, created_at
             FROM memory_versions WHERE entity_id = ?1 ORDER BY version_number ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![entity_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (entity_id, version_number, change_type, content_snapshot, change_reason, session_id, request_id, created_at) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(VersionSnapshot {
            entity_id,
            version_number,
            change_type: serde_json::from_str::<ChangeType>(&format!("\"{change_type}\""))
                .map_err(|e| to_storage_err(format!("parse change_type: {e}")))?,
            content_snapshot: serde_json::from_str(&content_snapshot)
                .map_err(|e| to_storage_err(format!("parse content_snapshot: {e}")))?,
            change_reason,
            session_id,
            request_id,
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| to_storage_err(format!("parse created_at: {e}")))?,
        });
    }
    Ok(out)
}

/// Next version number for an entity (1 if it has none yet).
pub fn next_version_number(conn: &Connection, entity_id: &str) -> VerityResult<u32> {
    let max: Option<u32> = conn
        .query_row(
            "SELECT MAX(version_number) FROM memory_versions WHERE entity_id = ?1",
            params![entity_id],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(max.unwrap_or(0) + 1)
}
