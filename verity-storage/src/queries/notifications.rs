//! Client-polled notifications (no real-time push).

use rusqlite::params;
use rusqlite::Connection;

use verity_core::errors::VerityResult;
use verity_core::models::Notification;

use crate::to_storage_err;

pub fn insert_notification(conn: &Connection, notification: &Notification) -> VerityResult<()> {
    let notification_type = serde_json::to_string(&notification.notification_type)
        .map(|s| s.trim_matches('"').to_string())
        .map_err(|e| to_storage_err(e.to_string()))?;
    let context = serde_json::to_string(&notification.context).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO notifications (id, notification_type, memory_id, content, context, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            notification.id,
            notification_type,
            notification.memory_id,
            notification.content,
            context,
            notification.read as i32,
            notification.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
