//! Database row models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A physical sample, unique by (library_name, material_name)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Material {
    pub id: i64,
    pub library_name: String,
    pub material_name: String,
    pub category: String,
    pub location: Option<String>,
    pub comments: Option<String>,
}

/// An imported file, unique by content hash
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SourceFile {
    pub id: i64,
    pub original_name: String,
    pub format: String,
    pub sha256: String,
    pub importer_plugin: Option<String>,
    pub status: String,
    pub notes: Option<String>,
}

/// One measurement event on a material
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Spectrum {
    pub id: i64,
    pub material_id: i64,
    pub source_file_id: Option<i64>,
    pub source: String,
    pub wavelength_unit: String,
    pub reflectance_unit: String,
    pub acquisition_date: Option<NaiveDate>,
    pub quality_status: String,
    pub plugin_id: Option<String>,
    pub comments: Option<String>,
}

/// One sample point; order_index preserves the imported sequence order
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SpectrumPoint {
    pub id: i64,
    pub spectrum_id: i64,
    pub order_index: i64,
    pub wavelength: f64,
    pub reflectance: f64,
    pub uncertainty: Option<f64>,
}

/// Free-text label shared across spectra
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Append-only metadata snapshot for a spectrum
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SpectrumVersion {
    pub id: i64,
    pub spectrum_id: i64,
    pub version_number: i64,
    pub reason: Option<String>,
    pub metadata_snapshot: String,
}

/// Append-only audit entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChangeLogEntry {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub payload: Option<String>,
    pub user: Option<String>,
    pub plugin_id: Option<String>,
}
