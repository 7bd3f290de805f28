//! File format importers
//!
//! Each importer exposes a cheap capability probe (`can_handle`) and a full
//! parse (`load`) that normalizes one input file into [`SpectrumRecord`]s.
//! Importers are registered into an [`ImporterRegistry`] in priority order;
//! no dynamic loading, static registration at startup suffices.

pub mod asd_ascii;
pub mod csv;
pub mod registry;

pub use asd_ascii::AsdAsciiImporter;
pub use csv::CsvSpectrumImporter;
pub use registry::ImporterRegistry;

use chrono::NaiveDate;
use speclib_common::Result;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Problem scoped to a single row or record. Parsers downgrade these to
/// warning strings instead of failing the whole file.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RowError(pub String);

/// Normalized representation of an imported spectrum.
///
/// Hand-off contract between parsing and persistence; never stored directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumRecord {
    pub library_name: String,
    pub material_name: String,
    pub category: String,
    pub source: String,
    pub wavelength_unit: String,
    pub reflectance_unit: String,
    pub wavelengths: Vec<f64>,
    pub reflectance: Vec<f64>,
    pub location: Option<String>,
    pub acquisition_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

impl SpectrumRecord {
    /// Check the series invariants: parallel sequences, at least one point.
    pub fn validate(&self) -> std::result::Result<(), RowError> {
        if self.wavelengths.len() != self.reflectance.len() {
            return Err(RowError(
                "wavelengths and reflectance must have equal length".to_string(),
            ));
        }
        if self.wavelengths.is_empty() {
            return Err(RowError(
                "spectrum must contain at least one data point".to_string(),
            ));
        }
        Ok(())
    }
}

/// Context provided to importers (user options, target library override).
///
/// Values supplied here take precedence over values discovered in the file.
#[derive(Debug, Clone, Default)]
pub struct ImportContext {
    pub target_library: Option<String>,
    pub extra_options: BTreeMap<String, String>,
}

/// Result from an importer execution
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub records: Vec<SpectrumRecord>,
    pub warnings: Vec<String>,
}

/// Capability interface all importers implement
pub trait Importer: Send + Sync {
    /// Stable identifier, recorded as the source file's importer plugin
    fn name(&self) -> &'static str;

    /// File extensions this importer is interested in (lowercase, no dot)
    fn formats(&self) -> &'static [&'static str];

    /// Cheap, read-only sniff: extension plus, for ambiguous formats, a
    /// bounded prefix of the file content
    fn can_handle(&self, path: &Path) -> bool;

    /// Full parse of one file into normalized records plus warnings
    fn load(&self, path: &Path, context: &ImportContext) -> Result<ImportResult>;
}
