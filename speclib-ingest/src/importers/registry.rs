//! Importer registry
//!
//! Holds the registered importers in priority order (registration order,
//! first registered wins ties) and dispatches files to the first capable
//! importer that yields records.

use super::{AsdAsciiImporter, CsvSpectrumImporter, ImportContext, ImportResult, Importer};
use speclib_common::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Ordered collection of registered importers
pub struct ImporterRegistry {
    importers: Vec<Box<dyn Importer>>,
}

impl ImporterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
        }
    }

    /// Create a registry with the built-in importers registered
    pub fn with_default_importers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CsvSpectrumImporter));
        registry.register(Box::new(AsdAsciiImporter));
        registry
    }

    /// Append an importer; registration order is priority order
    pub fn register(&mut self, importer: Box<dyn Importer>) {
        self.importers.push(importer);
    }

    /// All registered importers, in priority order
    pub fn available_importers(&self) -> impl Iterator<Item = &dyn Importer> {
        self.importers.iter().map(|importer| importer.as_ref())
    }

    /// All importers reporting capability for a path, in priority order
    pub fn find_for_path(&self, path: &Path) -> Vec<&dyn Importer> {
        self.importers
            .iter()
            .map(|importer| importer.as_ref())
            .filter(|importer| importer.can_handle(path))
            .collect()
    }

    /// Parse a file with the first capable importer that yields records.
    ///
    /// Returns the parse result together with the handling importer's name.
    /// A parser-internal hard failure propagates immediately; exhausting all
    /// capable importers without records is the distinct
    /// [`Error::UnsupportedFormat`].
    pub fn import_file(
        &self,
        path: &Path,
        context: &ImportContext,
    ) -> Result<(ImportResult, &'static str)> {
        for importer in self.find_for_path(path) {
            let result = importer.load(path, context)?;
            if !result.records.is_empty() {
                debug!(
                    importer = importer.name(),
                    records = result.records.len(),
                    warnings = result.warnings.len(),
                    path = %path.display(),
                    "Importer handled file"
                );
                return Ok((result, importer.name()));
            }
        }

        Err(Error::UnsupportedFormat(path.display().to_string()))
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::with_default_importers()
    }
}
