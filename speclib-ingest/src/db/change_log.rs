//! Change log database operations
//!
//! Append-only audit trail of catalog mutations.

use speclib_common::db::models::ChangeLogEntry;
use speclib_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

/// Fields for a new change log entry
pub struct NewChangeLogEntry<'a> {
    pub entity_type: &'a str,
    pub entity_id: String,
    pub action: &'a str,
    pub payload: Option<serde_json::Value>,
    pub user: Option<&'a str>,
    pub plugin_id: Option<&'a str>,
}

/// Append an audit entry
pub async fn append(conn: &mut SqliteConnection, entry: &NewChangeLogEntry<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO change_log (entity_type, entity_id, action, payload, user, plugin_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.entity_type)
    .bind(&entry.entity_id)
    .bind(entry.action)
    .bind(entry.payload.as_ref().map(|payload| payload.to_string()))
    .bind(entry.user)
    .bind(entry.plugin_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Load the audit entries for one entity, oldest first
pub async fn load_for_entity(
    pool: &SqlitePool,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<ChangeLogEntry>> {
    let entries = sqlx::query_as::<_, ChangeLogEntry>(
        r#"
        SELECT id, entity_type, entity_id, action, payload, user, plugin_id
        FROM change_log
        WHERE entity_type = ? AND entity_id = ?
        ORDER BY id
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
