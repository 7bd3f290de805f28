//! Catalog database operations
//!
//! One module per table. Write-path functions take `&mut SqliteConnection`
//! so they compose inside a single import transaction; read-path functions
//! take the pool directly.

pub mod change_log;
pub mod materials;
pub mod points;
pub mod source_files;
pub mod spectra;
pub mod tags;
pub mod versions;
