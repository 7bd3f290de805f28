//! Database initialization
//!
//! Opens (or creates) the catalog database and applies the schema. All
//! `CREATE TABLE` statements are idempotent, so initialization is safe to
//! run on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Foreign keys must be enabled per connection; WAL allows concurrent
    // readers while one import writes.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all catalog tables (idempotent, dependency order)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_materials_table(pool).await?;
    create_source_files_table(pool).await?;
    create_spectra_table(pool).await?;
    create_spectrum_points_table(pool).await?;
    create_tags_table(pool).await?;
    create_spectrum_tags_table(pool).await?;
    create_spectrum_versions_table(pool).await?;
    create_change_log_table(pool).await?;

    Ok(())
}

pub async fn create_materials_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            library_name TEXT NOT NULL,
            material_name TEXT NOT NULL,
            category TEXT NOT NULL,
            location TEXT,
            comments TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (library_name, material_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_source_files_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS source_files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            original_name TEXT NOT NULL,
            format TEXT NOT NULL,
            sha256 TEXT NOT NULL UNIQUE,
            importer_plugin TEXT,
            status TEXT NOT NULL DEFAULT 'success',
            notes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_spectra_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS spectra (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            material_id INTEGER NOT NULL
                REFERENCES materials(id) ON DELETE CASCADE,
            source_file_id INTEGER
                REFERENCES source_files(id) ON DELETE SET NULL,
            source TEXT NOT NULL,
            wavelength_unit TEXT NOT NULL,
            reflectance_unit TEXT NOT NULL,
            acquisition_date DATE,
            quality_status TEXT NOT NULL DEFAULT 'complete',
            plugin_id TEXT,
            comments TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_spectrum_points_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS spectrum_points (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            spectrum_id INTEGER NOT NULL
                REFERENCES spectra(id) ON DELETE CASCADE,
            order_index INTEGER NOT NULL,
            wavelength REAL NOT NULL,
            reflectance REAL NOT NULL,
            uncertainty REAL,
            UNIQUE (spectrum_id, order_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_spectrum_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS spectrum_tags (
            spectrum_id INTEGER NOT NULL
                REFERENCES spectra(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL
                REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (spectrum_id, tag_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_spectrum_versions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS spectrum_versions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            spectrum_id INTEGER NOT NULL
                REFERENCES spectra(id) ON DELETE CASCADE,
            version_number INTEGER NOT NULL,
            reason TEXT,
            metadata_snapshot TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (spectrum_id, version_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_change_log_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS change_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            action TEXT NOT NULL,
            payload TEXT,
            user TEXT,
            plugin_id TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_all_tables() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pool = init_database(&temp_dir.path().join("catalog.db"))
            .await
            .unwrap();

        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();

        for expected in [
            "change_log",
            "materials",
            "source_files",
            "spectra",
            "spectrum_points",
            "spectrum_tags",
            "spectrum_versions",
            "tags",
        ] {
            assert!(
                tables.iter().any(|table| table == expected),
                "missing table {expected}"
            );
        }
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        let first = init_database(&db_path).await.unwrap();
        first.close().await;
        init_database(&db_path).await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pool = init_database(&temp_dir.path().join("catalog.db"))
            .await
            .unwrap();

        // Spectrum referencing a missing material must be rejected
        let result = sqlx::query(
            "INSERT INTO spectra (material_id, source, wavelength_unit, reflectance_unit) \
             VALUES (999, 'ASD', 'nm', 'fraction')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }
}
