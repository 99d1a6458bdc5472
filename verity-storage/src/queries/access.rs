//! Append-only access log.

use rusqlite::{params, Connection};

use verity_core::errors::VerityResult;
use verity_core::models::{AccessEvent, AccessType};

use crate::to_storage_err;

pub fn record_access(conn: &Connection, event: &AccessEvent) -> VerityResult<()> {
    let access_type = serde_json::to_string(&event.access_type)
        .map(|s| s.trim_matches('"').to_string())
        .map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO access_events (entity_id, access_type, session_id, query_text, result_rank, similarity, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.entity_id,
            access_type,
            event.session_id,
            event.query_text,
            event.result_rank,
            event.similarity,
            event.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn access_log(conn: &Connection, entity_id: &str, limit: usize) -> VerityResult<Vec<AccessEvent>> {
    let mut stmt = conn
        .prepare(
            "SELECT entity_id, access_type, session_id, query_text, result_rank, similarity, created_at
             FROM access_events WHERE entity_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![entity_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<u32>>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (entity_id, access_type, session_id, query_text, result_rank, similarity, created_at) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        out.push(AccessEvent {
            entity_id,
            access_type: serde_json::from_str::<AccessType>(&format!("\"{access_type}\""))
                .map_err(|e| to_storage_err(format!("parse access_type: {e}")))?,
            session_id,
            query_text,
            result_rank,
            similarity,
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| to_storage_err(format!("parse created_at: {e}")))?,
        });
    }
    Ok(out)
}
