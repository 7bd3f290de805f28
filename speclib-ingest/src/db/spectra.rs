//! Spectrum database operations

use chrono::NaiveDate;
use speclib_common::db::models::Spectrum;
use speclib_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

/// Fields for a new spectrum row
pub struct NewSpectrum<'a> {
    pub material_id: i64,
    pub source_file_id: Option<i64>,
    pub source: &'a str,
    pub wavelength_unit: &'a str,
    pub reflectance_unit: &'a str,
    pub acquisition_date: Option<NaiveDate>,
    pub quality_status: &'a str,
    pub plugin_id: Option<&'a str>,
    pub comments: Option<&'a str>,
}

/// Insert a new spectrum row, returning its id
pub async fn insert(conn: &mut SqliteConnection, spectrum: &NewSpectrum<'_>) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO spectra (
            material_id, source_file_id, source, wavelength_unit, reflectance_unit,
            acquisition_date, quality_status, plugin_id, comments
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(spectrum.material_id)
    .bind(spectrum.source_file_id)
    .bind(spectrum.source)
    .bind(spectrum.wavelength_unit)
    .bind(spectrum.reflectance_unit)
    .bind(spectrum.acquisition_date)
    .bind(spectrum.quality_status)
    .bind(spectrum.plugin_id)
    .bind(spectrum.comments)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load all spectra, grouped-friendly order (material, then id)
pub async fn load_all(pool: &SqlitePool) -> Result<Vec<Spectrum>> {
    let spectra = sqlx::query_as::<_, Spectrum>(
        r#"
        SELECT id, material_id, source_file_id, source, wavelength_unit, reflectance_unit,
               acquisition_date, quality_status, plugin_id, comments
        FROM spectra
        ORDER BY material_id, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(spectra)
}

/// Load the spectra belonging to one material
pub async fn load_for_material(pool: &SqlitePool, material_id: i64) -> Result<Vec<Spectrum>> {
    let spectra = sqlx::query_as::<_, Spectrum>(
        r#"
        SELECT id, material_id, source_file_id, source, wavelength_unit, reflectance_unit,
               acquisition_date, quality_status, plugin_id, comments
        FROM spectra
        WHERE material_id = ?
        ORDER BY id
        "#,
    )
    .bind(material_id)
    .fetch_all(pool)
    .await?;

    Ok(spectra)
}

/// Count spectra
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM spectra")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
