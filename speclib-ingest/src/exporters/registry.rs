//! Exporter registry

use super::{CsvSpectrumExporter, ExportContext, ExportPayload, Exporter};
use speclib_common::{Error, Result};
use std::path::PathBuf;

/// Exporters keyed by format name
pub struct ExportRegistry {
    exporters: Vec<Box<dyn Exporter>>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self {
            exporters: Vec::new(),
        }
    }

    /// Create a registry with the built-in exporters registered
    pub fn with_default_exporters() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CsvSpectrumExporter));
        registry
    }

    /// Register an exporter; a later registration with the same format name
    /// shadows the earlier one
    pub fn register(&mut self, exporter: Box<dyn Exporter>) {
        self.exporters.push(exporter);
    }

    /// Registered format names
    pub fn available_formats(&self) -> Vec<&'static str> {
        self.exporters
            .iter()
            .map(|exporter| exporter.format_name())
            .collect()
    }

    /// Look up an exporter by format name (latest registration wins)
    pub fn get(&self, format_name: &str) -> Option<&dyn Exporter> {
        self.exporters
            .iter()
            .rev()
            .map(|exporter| exporter.as_ref())
            .find(|exporter| exporter.format_name() == format_name)
    }

    /// Export a payload with the named format
    pub fn export(
        &self,
        format_name: &str,
        payload: &ExportPayload,
        context: &ExportContext,
    ) -> Result<PathBuf> {
        let exporter = self
            .get(format_name)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown export format: {format_name}")))?;
        exporter.export(payload, context)
    }
}

impl Default for ExportRegistry {
    fn default() -> Self {
        Self::with_default_exporters()
    }
}
