//! Spectrum point database operations

use speclib_common::db::models::SpectrumPoint;
use speclib_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

/// Insert the points of one spectrum by enumerating the parallel series.
///
/// order_index starts at 1 and preserves the imported sequence order; points
/// are not sorted by wavelength.
pub async fn insert_series(
    conn: &mut SqliteConnection,
    spectrum_id: i64,
    wavelengths: &[f64],
    reflectance: &[f64],
) -> Result<()> {
    for (offset, (wavelength, value)) in wavelengths
        .iter()
        .copied()
        .zip(reflectance.iter().copied())
        .enumerate()
    {
        sqlx::query(
            r#"
            INSERT INTO spectrum_points (spectrum_id, order_index, wavelength, reflectance)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(spectrum_id)
        .bind((offset + 1) as i64)
        .bind(wavelength)
        .bind(value)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Load the points of one spectrum in sequence order
pub async fn load_for_spectrum(pool: &SqlitePool, spectrum_id: i64) -> Result<Vec<SpectrumPoint>> {
    let points = sqlx::query_as::<_, SpectrumPoint>(
        r#"
        SELECT id, spectrum_id, order_index, wavelength, reflectance, uncertainty
        FROM spectrum_points
        WHERE spectrum_id = ?
        ORDER BY order_index
        "#,
    )
    .bind(spectrum_id)
    .fetch_all(pool)
    .await?;

    Ok(points)
}

/// Count points across all spectra
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM spectrum_points")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
