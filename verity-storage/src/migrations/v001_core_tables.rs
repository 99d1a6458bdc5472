//! v001: memories, edges.

use rusqlite::Connection;

use verity_core::errors::VerityResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> VerityResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memories (
            id                   TEXT PRIMARY KEY,
            content              TEXT NOT NULL,
            origin_kind          TEXT NOT NULL,
            origin_source        TEXT,
            origin_derived_from  TEXT,
            resolves_by          TEXT,
            outcome_condition    TEXT,
            assumes              TEXT NOT NULL DEFAULT '[]',
            invalidates_if       TEXT NOT NULL DEFAULT '[]',
            confirms_if          TEXT NOT NULL DEFAULT '[]',
            tags                 TEXT NOT NULL DEFAULT '[]',
            starting_confidence  REAL NOT NULL,
            confirmations        INTEGER NOT NULL DEFAULT 0,
            times_tested         INTEGER NOT NULL DEFAULT 0,
            contradictions       INTEGER NOT NULL DEFAULT 0,
            centrality           INTEGER NOT NULL DEFAULT 0,
            propagated_confidence REAL,
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL,
            state                TEXT NOT NULL,
            retracted            INTEGER NOT NULL DEFAULT 0,
            retracted_at         TEXT,
            retraction_reason    TEXT,
            violations           TEXT NOT NULL DEFAULT '[]',
            resolution_outcome   TEXT,
            resolved_at          TEXT,
            exposure_status      TEXT NOT NULL DEFAULT 'pending',
            content_hash         TEXT NOT NULL,
            agent_id             TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_memories_content_hash ON memories(content_hash);
        CREATE INDEX IF NOT EXISTS idx_memories_exposure_status ON memories(exposure_status);
        CREATE INDEX IF NOT EXISTS idx_memories_resolves_by ON memories(resolves_by);
        CREATE INDEX IF NOT EXISTS idx_memories_state ON memories(state);
        CREATE INDEX IF NOT EXISTS idx_memories_agent_id ON memories(agent_id);

        CREATE TABLE IF NOT EXISTS edges (
            source_id   TEXT NOT NULL,
            target_id   TEXT NOT NULL,
            edge_type   TEXT NOT NULL,
            strength    REAL NOT NULL DEFAULT 1.0,
            created_at  TEXT NOT NULL,
            PRIMARY KEY (source_id, target_id, edge_type),
            FOREIGN KEY (source_id) REFERENCES memories(id) ON DELETE CASCADE,
            FOREIGN KEY (target_id) REFERENCES memories(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
        CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);
        CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(edge_type);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
