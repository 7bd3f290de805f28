//! Application services orchestrating imports and library queries

pub mod import_service;
pub mod library_service;
