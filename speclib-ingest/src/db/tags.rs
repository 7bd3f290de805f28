//! Tag database operations
//!
//! Tag names are unique; the join table links tags to spectra.

use speclib_common::db::models::Tag;
use speclib_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

/// Load a tag by name
pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Tag>> {
    let tag = sqlx::query_as::<_, Tag>(
        "SELECT id, name, description FROM tags WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(tag)
}

/// Insert a new tag, returning its id
pub async fn insert(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO tags (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Link a tag to a spectrum; linking twice is a no-op
pub async fn attach(conn: &mut SqliteConnection, spectrum_id: i64, tag_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO spectrum_tags (spectrum_id, tag_id) VALUES (?, ?)")
        .bind(spectrum_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Load the tags attached to one spectrum
pub async fn load_for_spectrum(pool: &SqlitePool, spectrum_id: i64) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT tags.id, tags.name, tags.description
        FROM tags
        JOIN spectrum_tags ON spectrum_tags.tag_id = tags.id
        WHERE spectrum_tags.spectrum_id = ?
        ORDER BY tags.name
        "#,
    )
    .bind(spectrum_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// Count tag rows
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
