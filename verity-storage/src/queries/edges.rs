//! Edge CRUD and frontier lookups (§4.1 batched edge queries).

use rusqlite::{params, Connection};

use verity_core::errors::VerityResult;
use verity_core::memory::{Edge, EdgeType, EdgeTypeFilter};

use crate::to_storage_err;

fn edge_type_str(edge_type: EdgeType) -> VerityResult<String> {
    serde_json::to_string(&edge_type)
        .map(|s| s.trim_matches('"').to_string())
        .map_err(|e| to_storage_err(e.to_string()))
}

fn parse_edge_type(s: &str) -> VerityResult<EdgeType> {
    serde_json::from_str(&format!("\"{s}\"")).map_err(|e| to_storage_err(format!("parse edge_type '{s}': {e}")))
}

pub fn insert_edge(conn: &Connection, edge: &Edge) -> VerityResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO edges (source_id, target_id, edge_type, strength, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            edge.source_id,
            edge.target_id,
            edge_type_str(edge.edge_type)?,
            edge.strength,
            edge.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn delete_edge(conn: &Connection, source_id: &str, target_id: &str, edge_type: EdgeType) -> VerityResult<()> {
    conn.execute(
        "DELETE FROM edges WHERE source_id = ?1 AND target_id = ?2 AND edge_type = ?3",
        params![source_id, target_id, edge_type_str(edge_type)?],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn outgoing_edges(conn: &Connection, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
    query_edges(
        conn,
        "SELECT source_id, target_id, edge_type, strength, created_at FROM edges WHERE source_id = ?1",
        memory_id,
        filter,
    )
}

pub fn incoming_edges(conn: &Connection, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
    query_edges(
        conn,
        "SELECT source_id, target_id, edge_type, strength, created_at FROM edges WHERE target_id = ?1",
        memory_id,
        filter,
    )
}

fn query_edges(conn: &Connection, sql: &str, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![memory_id], raw_edge_row)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let edge = edge_from_raw(row.map_err(|e| to_storage_err(e.to_string()))?)?;
        if filter.matches(edge.edge_type) {
            out.push(edge);
        }
    }
    Ok(out)
}

pub fn all_signed_edges(conn: &Connection) -> VerityResult<Vec<Edge>> {
    let mut stmt = conn
        .prepare(
            "SELECT source_id, target_id, edge_type, strength, created_at FROM edges
             WHERE edge_type IN ('derived_from', 'confirmed_by', 'violated_by')",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt.query_map([], raw_edge_row).map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(edge_from_raw(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}

type RawEdgeRow = (String, String, String, f64, String);

fn raw_edge_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEdgeRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn edge_from_raw(raw: RawEdgeRow) -> VerityResult<Edge> {
    let (source_id, target_id, edge_type_str, strength, created_at_str) = raw;
    Ok(Edge {
        source_id,
        target_id,
        edge_type: parse_edge_type(&edge_type_str)?,
        strength,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| to_storage_err(format!("parse created_at: {e}")))?,
    })
}
