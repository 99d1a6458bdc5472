//! Insert, update, get, delete for memories.

use rusqlite::{params, Connection, OptionalExtension};

use verity_core::errors::VerityResult;
use verity_core::memory::{Confidence, ExposureStatus, Memory, Origin, ResolutionOutcome};

use crate::to_storage_err;

fn serialize_origin(origin: &Origin) -> (&'static str, Option<String>, Option<String>) {
    match origin {
        Origin::Observation { source } => ("observation", Some(source.clone()), None),
        Origin::Thought { derived_from } => {
            ("thought", None, Some(serde_json::to_string(derived_from).unwrap_or_default()))
        }
    }
}

fn deserialize_origin(kind: &str, source: Option<String>, derived_from: Option<String>) -> VerityResult<Origin> {
    match kind {
        "observation" => Ok(Origin::Observation { source: source.unwrap_or_default() }),
        "thought" => {
            let list: Vec<String> = derived_from
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(|e| to_storage_err(format!("parse origin_derived_from: {e}")))?
                .unwrap_or_default();
            Ok(Origin::Thought { derived_from: list })
        }
        other => Err(to_storage_err(format!("unknown origin kind '{other}'"))),
    }
}

pub fn insert_memory(conn: &Connection, memory: &Memory) -> VerityResult<()> {
    let (origin_kind, origin_source, origin_derived_from) = serialize_origin(&memory.origin);
    let assumes = serde_json::to_string(&memory.assumes).map_err(|e| to_storage_err(e.to_string()))?;
    let invalidates_if = serde_json::to_string(&memory.invalidates_if).map_err(|e| to_storage_err(e.to_string()))?;
    let confirms_if = serde_json::to_string(&memory.confirms_if).map_err(|e| to_storage_err(e.to_string()))?;
    let tags = serde_json::to_string(&memory.tags).map_err(|e| to_storage_err(e.to_string()))?;
    let violations = serde_json::to_string(&memory.violations).map_err(|e| to_storage_err(e.to_string()))?;
    let state = serde_json::to_string(&memory.state).map_err(|e| to_storage_err(e.to_string()))?;
    let exposure_status = serde_json::to_string(&memory.exposure_status).map_err(|e| to_storage_err(e.to_string()))?;
    let resolution_outcome = memory
        .resolution_outcome
        .map(|o| serde_json::to_string(&o))
        .transpose()
        .map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO memories (
            id, content, origin_kind, origin_source, origin_derived_from,
            resolves_by, outcome_condition, assumes, invalidates_if, confirms_if, tags,
            starting_confidence, confirmations, times_tested, contradictions, centrality,
            propagated_confidence, created_at, updated_at, state, retracted, retracted_at,
            retraction_reason, violations, resolution_outcome, resolved_at,
            exposure_status, content_hash, agent_id
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
            ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29
        )",
        params![
            memory.id,
            memory.content,
            origin_kind,
            origin_source,
            origin_derived_from,
            memory.resolves_by.map(|t| t.to_rfc3339()),
            memory.outcome_condition,
            assumes,
            invalidates_if,
            confirms_if,
            tags,
            memory.starting_confidence.value(),
            memory.confirmations,
            memory.times_tested,
            memory.contradictions,
            memory.centrality,
            memory.propagated_confidence.map(|c| c.value()),
            memory.created_at.to_rfc3339(),
            memory.updated_at.to_rfc3339(),
            trim_quoted(&state),
            memory.retracted as i32,
            memory.retracted_at.map(|t| t.to_rfc3339()),
            memory.retraction_reason,
            violations,
            resolution_outcome.as_deref().map(trim_quoted),
            memory.resolved_at.map(|t| t.to_rfc3339()),
            trim_quoted(&exposure_status),
            memory.content_hash,
            memory.agent_id,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn update_memory(conn: &Connection, memory: &Memory) -> VerityResult<()> {
    let assumes = serde_json::to_string(&memory.assumes).map_err(|e| to_storage_err(e.to_string()))?;
    let invalidates_if = serde_json::to_string(&memory.invalidates_if).map_err(|e| to_storage_err(e.to_string()))?;
    let confirms_if = serde_json::to_string(&memory.confirms_if).map_err(|e| to_storage_err(e.to_string()))?;
    let tags = serde_json::to_string(&memory.tags).map_err(|e| to_storage_err(e.to_string()))?;
    let violations = serde_json::to_string(&memory.violations).map_err(|e| to_storage_err(e.to_string()))?;
    let state = serde_json::to_string(&memory.state).map_err(|e| to_storage_err(e.to_string()))?;
    let exposure_status = serde_json::to_string(&memory.exposure_status).map_err(|e| to_storage_err(e.to_string()))?;
    let resolution_outcome = memory
        .resolution_outcome
        .map(|o| serde_json::to_string(&o))
        .transpose()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = conn
        .execute(
            "UPDATE memories SET
                content = ?2, resolves_by = ?3, outcome_condition = ?4, assumes = ?5,
                invalidates_if = ?6, confirms_if = ?7, tags = ?8, starting_confidence = ?9,
                confirmations = ?10, times_tested = ?11, contradictions = ?12, centrality = ?13,
                propagated_confidence = ?14, updated_at = ?15, state = ?16, retracted = ?17,
                retracted_at = ?18, retraction_reason = ?19, violations = ?20,
                resolution_outcome = ?21, resolved_at = ?22, exposure_status = ?23,
                content_hash = ?24
             WHERE id = ?1",
            params![
                memory.id,
                memory.content,
                memory.resolves_by.map(|t| t.to_rfc3339()),
                memory.outcome_condition,
                assumes,
                invalidates_if,
                confirms_if,
                tags,
                memory.starting_confidence.value(),
                memory.confirmations,
                memory.times_tested,
                memory.contradictions,
                memory.centrality,
                memory.propagated_confidence.map(|c| c.value()),
                memory.updated_at.to_rfc3339(),
                trim_quoted(&state),
                memory.retracted as i32,
                memory.retracted_at.map(|t| t.to_rfc3339()),
                memory.retraction_reason,
                violations,
                resolution_outcome.as_deref().map(trim_quoted),
                memory.resolved_at.map(|t| t.to_rfc3339()),
                trim_quoted(&exposure_status),
                memory.content_hash,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    if rows == 0 {
        return Err(verity_core::errors::VerityError::not_found(format!("memory {}", memory.id)));
    }
    Ok(())
}

pub fn delete_memory(conn: &Connection, id: &str) -> VerityResult<()> {
    conn.execute("DELETE FROM memories WHERE id = ?1", params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

const MEMORY_COLUMNS: &str = "id, content, origin_kind, origin_source, origin_derived_from,
    resolves_by, outcome_condition, assumes, invalidates_if, confirms_if, tags,
    starting_confidence, confirmations, times_tested, contradictions, centrality,
    propagated_confidence, created_at, updated_at, state, retracted, retracted_at,
    retraction_reason, violations, resolution_outcome, resolved_at,
    exposure_status, content_hash, agent_id";

pub fn get_memory(conn: &Connection, id: &str) -> VerityResult<Option<Memory>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;

    stmt.query_row(params![id], |row| Ok(row_to_memory(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .transpose()
}

pub fn find_by_content_hash(conn: &Connection, hash: &str) -> VerityResult<Vec<Memory>> {
    query_all(
        conn,
        &format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE content_hash = ?1"),
        params![hash],
    )
}

pub fn find_pending_exposure(
    conn: &Connection,
    older_than: chrono::DateTime<chrono::Utc>,
    limit: usize,
) -> VerityResult<Vec<Memory>> {
    query_all(
        conn,
        &format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE exposure_status = 'pending' AND updated_at <= ?1 ORDER BY updated_at ASC LIMIT ?2"
        ),
        params![older_than.to_rfc3339(), limit as i64],
    )
}

pub fn find_due_for_resolution(conn: &Connection, as_of: chrono::DateTime<chrono::Utc>) -> VerityResult<Vec<Memory>> {
    query_all(
        conn,
        &format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE resolves_by IS NOT NULL AND resolves_by <= ?1 AND resolution_outcome IS NULL"
        ),
        params![as_of.to_rfc3339()],
    )
}

/// Unfiltered scan, newest-first, for query-path operations (brittle,
/// collisions) that need to weigh every memory rather than a named id or
/// edge frontier.
pub fn scan_memories(conn: &Connection, limit: usize) -> VerityResult<Vec<Memory>> {
    query_all(
        conn,
        &format!("SELECT {MEMORY_COLUMNS} FROM memories ORDER BY updated_at DESC LIMIT ?1"),
        params![limit as i64],
    )
}

fn query_all(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> VerityResult<Vec<Memory>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params, |row| Ok(row_to_memory(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(out)
}

fn trim_quoted(s: &str) -> String {
    s.trim_matches('"').to_string()
}

fn row_to_memory(row: &rusqlite::Row<'_>) -> VerityResult<Memory> {
    let parse_dt = |s: String| -> VerityResult<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
    };
    let parse_opt_dt = |s: Option<String>| -> VerityResult<Option<chrono::DateTime<chrono::Utc>>> {
        s.map(parse_dt).transpose()
    };

    let origin_kind: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let origin_source: Option<String> = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let origin_derived_from: Option<String> = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let origin = deserialize_origin(&origin_kind, origin_source, origin_derived_from)?;

    let assumes: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let invalidates_if: String = row.get(8).map_err(|e| to_storage_err(e.to_string()))?;
    let confirms_if: String = row.get(9).map_err(|e| to_storage_err(e.to_string()))?;
    let tags: String = row.get(10).map_err(|e| to_storage_err(e.to_string()))?;
    let violations: String = row.get(23).map_err(|e| to_storage_err(e.to_string()))?;
    let state: String = row.get(19).map_err(|e| to_storage_err(e.to_string()))?;
    let exposure_status: String = row.get(26).map_err(|e| to_storage_err(e.to_string()))?;
    let resolution_outcome: Option<String> = row.get(24).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Memory {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        content: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        origin,
        resolves_by: parse_opt_dt(row.get(5).map_err(|e| to_storage_err(e.to_string()))?)?,
        outcome_condition: row.get(6).map_err(|e| to_storage_err(e.to_string()))?,
        assumes: serde_json::from_str(&assumes).map_err(|e| to_storage_err(format!("parse assumes: {e}")))?,
        invalidates_if: serde_json::from_str(&invalidates_if)
            .map_err(|e| to_storage_err(format!("parse invalidates_if: {e}")))?,
        confirms_if: serde_json::from_str(&confirms_if)
            .map_err(|e| to_storage_err(format!("parse confirms_if: {e}")))?,
        tags: serde_json::from_str(&tags).map_err(|e| to_storage_err(format!("parse tags: {e}")))?,
        starting_confidence: Confidence::new(row.get(11).map_err(|e| to_storage_err(e.to_string()))?),
        confirmations: row.get(12).map_err(|e| to_storage_err(e.to_string()))?,
        times_tested: row.get(13).map_err(|e| to_storage_err(e.to_string()))?,
        contradictions: row.get(14).map_err(|e| to_storage_err(e.to_string()))?,
        centrality: row.get(15).map_err(|e| to_storage_err(e.to_string()))?,
        propagated_confidence: row
            .get::<_, Option<f64>>(16)
            .map_err(|e| to_storage_err(e.to_string()))?
            .map(Confidence::new),
        created_at: parse_dt(row.get(17).map_err(|e| to_storage_err(e.to_string()))?)?,
        updated_at: parse_dt(row.get(18).map_err(|e| to_storage_err(e.to_string()))?)?,
        state: serde_json::from_str(&format!("\"{state}\"")).map_err(|e| to_storage_err(format!("parse state: {e}")))?,
        retracted: row.get::<_, i64>(20).map_err(|e| to_storage_err(e.to_string()))? != 0,
        retracted_at: parse_opt_dt(row.get(21).map_err(|e| to_storage_err(e.to_string()))?)?,
        retraction_reason: row.get(22).map_err(|e| to_storage_err(e.to_string()))?,
        violations: serde_json::from_str(&violations)
            .map_err(|e| to_storage_err(format!("parse violations: {e}")))?,
        resolution_outcome: resolution_outcome
            .map(|s| serde_json::from_str::<ResolutionOutcome>(&format!("\"{s}\"")))
            .transpose()
            .map_err(|e| to_storage_err(format!("parse resolution_outcome: {e}")))?,
        resolved_at: parse_opt_dt(row.get(25).map_err(|e| to_storage_err(e.to_string()))?)?,
        exposure_status: serde_json::from_str::<ExposureStatus>(&format!("\"{exposure_status}\""))
            .map_err(|e| to_storage_err(format!("parse exposure_status: {e}")))?,
        content_hash: row.get(27).map_err(|e| to_storage_err(e.to_string()))?,
        agent_id: row.get(28).map_err(|e| to_storage_err(e.to_string()))?,
    })
}
