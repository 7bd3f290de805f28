//! # Spectral Library Ingest
//!
//! Importer subsystem and query services for the spectral library catalog:
//! - Format importers (delimited CSV, instrument ASCII) and their registry
//! - Persistence/upsert engine turning normalized records into durable rows
//! - Library browser query service
//! - Exporters mirroring the importer seam

pub mod db;
pub mod exporters;
pub mod importers;
pub mod services;

pub use importers::{
    ImportContext, ImportResult, Importer, ImporterRegistry, RowError, SpectrumRecord,
};
pub use services::import_service::{ImportService, ImportSummary};
pub use services::library_service::{
    LibraryBrowserService, LibraryNode, MaterialNode, SpectrumNode,
};
