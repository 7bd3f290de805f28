//! Spectrum version snapshots
//!
//! Append-only metadata snapshots keyed by (spectrum_id, version_number).

use speclib_common::db::models::SpectrumVersion;
use speclib_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

/// Append a version snapshot for a spectrum
pub async fn insert(
    conn: &mut SqliteConnection,
    spectrum_id: i64,
    version_number: i64,
    reason: Option<&str>,
    metadata_snapshot: &serde_json::Value,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO spectrum_versions (spectrum_id, version_number, reason, metadata_snapshot)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(spectrum_id)
    .bind(version_number)
    .bind(reason)
    .bind(metadata_snapshot.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load the snapshots of one spectrum in version order
pub async fn load_for_spectrum(
    pool: &SqlitePool,
    spectrum_id: i64,
) -> Result<Vec<SpectrumVersion>> {
    let versions = sqlx::query_as::<_, SpectrumVersion>(
        r#"
        SELECT id, spectrum_id, version_number, reason, metadata_snapshot
        FROM spectrum_versions
        WHERE spectrum_id = ?
        ORDER BY version_number
        "#,
    )
    .bind(spectrum_id)
    .fetch_all(pool)
    .await?;

    Ok(versions)
}
