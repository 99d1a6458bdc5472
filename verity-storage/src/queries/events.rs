//! The C8 event queue: enqueue, claim-then-process dispatch, stuck-claim release.

use rusqlite::{params, Connection};

use verity_core::errors::VerityResult;
use verity_core::memory::DamageLevel;
use verity_core::models::{EventType, MemoryEvent};

use crate::to_storage_err;

pub fn enqueue_event(conn: &Connection, event: &MemoryEvent) -> VerityResult<()> {
    let event_type = serde_json::to_string(&event.event_type)
        .map(|s| s.trim_matches('"').to_string())
        .map_err(|e| to_storage_err(e.to_string()))?;
    let damage_level = event
        .damage_level
        .map(|d| serde_json::to_string(&d).map(|s| s.trim_matches('"').to_string()))
        .transpose()
        .map_err(|e| to_storage_err(e.to_string()))?;
    let context = serde_json::to_string(&event.context).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO memory_events
            (id, session_id, event_type, memory_id, violated_by, damage_level, context, created_at, dispatched, dispatched_at, workflow_id, claimed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL)",
        params![
            event.id,
            event.session_id,
            event_type,
            event.memory_id,
            event.violated_by,
            damage_level,
            context,
            event.created_at.to_rfc3339(),
            event.dispatched as i32,
            event.dispatched_at.map(|t| t.to_rfc3339()),
            event.workflow_id,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Atomically claim up to `limit` undispatched, unclaimed events for a session.
/// Claiming stamps `claimed_at` so a concurrent sweeper skips these rows until
/// either `mark_event_dispatched` or `release_stuck_events` clears the claim.
pub fn claim_events(conn: &Connection, session_id: &str, limit: usize) -> VerityResult<Vec<MemoryEvent>> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("claim_events begin: {e}")))?;

    let ids: Vec<String> = {
        let mut stmt = tx
            .prepare(
                "SELECT id FROM memory_events
                 WHERE session_id = ?1 AND dispatched = 0 AND claimed_at IS NULL
                 ORDER BY created_at ASC LIMIT ?2",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params![session_id, limit as i64], |row| row.get::<_, String>(0))
            .map_err(|e| to_storage_err(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))?
    };

    for id in &ids {
        tx.execute(
            "UPDATE memory_events SET claimed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?1",
            params![id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }

    let mut claimed = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(event) = get_event(&tx, id)? {
            claimed.push(event);
        }
    }

    tx.commit().map_err(|e| to_storage_err(format!("claim_events commit: {e}")))?;
    Ok(claimed)
}

/// Sessions whose most recent undispatched, unclaimed event is older than
/// `older_than` — the inactivity window has elapsed, so the sweeper should
/// claim and dispatch them.
pub fn find_inactive_sessions(conn: &Connection, older_than: chrono::DateTime<chrono::Utc>) -> VerityResult<Vec<String>> {
    let cutoff = older_than.to_rfc3339();
    let mut stmt = conn
        .prepare(
            "SELECT session_id FROM memory_events
             WHERE dispatched = 0 AND claimed_at IS NULL
             GROUP BY session_id
             HAVING MAX(created_at) <= ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![cutoff], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|e| to_storage_err(e.to_string()))
}

pub fn mark_event_dispatched(conn: &Connection, event_id: &str, workflow_id: Option<&str>) -> VerityResult<()> {
    conn.execute(
        "UPDATE memory_events SET dispatched = 1, dispatched_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), workflow_id = ?2
         WHERE id = ?1",
        params![event_id, workflow_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Release claims older than `grace` that never made it to dispatched, so a
/// crashed dispatcher doesn't strand events forever.
pub fn release_stuck_events(conn: &Connection, grace: chrono::Duration) -> VerityResult<usize> {
    let cutoff = (chrono::Utc::now() - grace).to_rfc3339();
    let rows = conn
        .execute(
            "UPDATE memory_events SET claimed_at = NULL
             WHERE dispatched = 0 AND claimed_at IS NOT NULL AND claimed_at <= ?1",
            params![cutoff],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(rows)
}

fn get_event(conn: &Connection, id: &str) -> VerityResult<Option<MemoryEvent>> {
    conn.query_row(
        "SELECT id, session_id, event_type, memory_id, violated_by, damage_level, context,
                created_at, dispatched, dispatched_at, workflow_id
         FROM memory_events WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, Option<String>>(9)?,
                row.get::<_, Option<String>>(10)?,
            ))
        },
    )
    .optional_to_verity()?
    .map(|(id, session_id, event_type, memory_id, violated_by, damage_level, context, created_at, dispatched, dispatched_at, workflow_id)| {
        Ok(MemoryEvent {
            id,
            session_id,
            event_type: serde_json::from_str::<EventType>(&format!("\"{event_type}\""))
                .map_err(|e| to_storage_err(format!("parse event_type: {e}")))?,
            memory_id,
            violated_by,
            damage_level: damage_level
                .map(|s| serde_json::from_str::<DamageLevel>(&format!("\"{s}\"")))
                .transpose()
                .map_err(|e| to_storage_err(format!("parse damage_level: {e}")))?,
            context: serde_json::from_str(&context).map_err(|e| to_storage_err(format!("parse context: {e}")))?,
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| to_storage_err(format!("parse created_at: {e}")))?,
            dispatched: dispatched != 0,
            dispatched_at: dispatched_at
                .map(|s| chrono::DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&chrono::Utc)))
                .transpose()
                .map_err(|e| to_storage_err(format!("parse dispatched_at: {e}")))?,
            workflow_id,
        })
    })
    .transpose()
}

trait OptionalToVerity<T> {
    fn optional_to_verity(self) -> VerityResult<Option<T>>;
}

impl<T> OptionalToVerity<T> for Result<T, rusqlite::Error> {
    fn optional_to_verity(self) -> VerityResult<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(to_storage_err(e.to_string())),
        }
    }
}
