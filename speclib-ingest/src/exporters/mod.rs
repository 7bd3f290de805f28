//! Spectrum exporters
//!
//! Mirror of the importer seam: exporters are registered by format name and
//! turn normalized [`SpectrumRecord`]s back into files.

pub mod csv;
pub mod registry;

pub use csv::CsvSpectrumExporter;
pub use registry::ExportRegistry;

use crate::importers::SpectrumRecord;
use speclib_common::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Data to be exported, expressed as normalized spectrum records
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub spectra: Vec<SpectrumRecord>,
    pub output_path: PathBuf,
}

/// Context modifiers for exporters (format options, user preferences)
#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    pub options: BTreeMap<String, String>,
}

/// Capability interface all exporters implement
pub trait Exporter: Send + Sync {
    /// Format name the exporter is registered under
    fn format_name(&self) -> &'static str;

    /// Write the payload, returning the path actually written
    fn export(&self, payload: &ExportPayload, context: &ExportContext) -> Result<PathBuf>;
}
