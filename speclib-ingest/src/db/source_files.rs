//! Source file database operations and content hashing
//!
//! Imported files are content-addressed: the SHA-256 of the file bytes is
//! globally unique, so re-importing identical bytes reuses the existing row.

use sha2::{Digest, Sha256};
use speclib_common::db::models::SourceFile;
use speclib_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use tracing::debug;

/// Fields for a new source file row
pub struct NewSourceFile<'a> {
    pub original_name: &'a str,
    pub format: &'a str,
    pub sha256: &'a str,
    pub importer_plugin: Option<&'a str>,
    pub status: &'a str,
    pub notes: Option<&'a str>,
}

/// Calculate the SHA-256 hash of a file, streaming its content in 1 MiB
/// chunks rather than loading it wholly into memory
pub async fn calculate_file_hash(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    debug!(path = %path.display(), "Calculating SHA-256 hash");

    let hash = tokio::task::spawn_blocking(move || -> Result<String> {
        use std::io::Read;

        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 1024 * 1024];

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    })
    .await
    .map_err(|err| Error::Internal(format!("Hash calculation task failed: {err}")))??;

    Ok(hash)
}

/// Load a source file by content hash
pub async fn find_by_sha256(
    conn: &mut SqliteConnection,
    sha256: &str,
) -> Result<Option<SourceFile>> {
    let source_file = sqlx::query_as::<_, SourceFile>(
        r#"
        SELECT id, original_name, format, sha256, importer_plugin, status, notes
        FROM source_files
        WHERE sha256 = ?
        "#,
    )
    .bind(sha256)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(source_file)
}

/// Insert a new source file row, returning its id
pub async fn insert(conn: &mut SqliteConnection, file: &NewSourceFile<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO source_files (original_name, format, sha256, importer_plugin, status, notes)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(file.original_name)
    .bind(file.format)
    .bind(file.sha256)
    .bind(file.importer_plugin)
    .bind(file.status)
    .bind(file.notes)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Count source files
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM source_files")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
