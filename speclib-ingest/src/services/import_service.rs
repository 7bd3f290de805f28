//! Import orchestration
//!
//! Loads a file through the importer registry and persists the resulting
//! records in one transaction: find-or-create the content-addressed source
//! file, find-or-update materials, insert spectra with their points and
//! tags, and record version snapshots plus audit entries. A failure anywhere
//! rolls back the whole batch.

use crate::db::{change_log, materials, points, source_files, spectra, tags, versions};
use crate::db::change_log::NewChangeLogEntry;
use crate::db::source_files::NewSourceFile;
use crate::db::spectra::NewSpectrum;
use crate::importers::{ImportContext, ImportResult, ImporterRegistry, SpectrumRecord};
use serde::Serialize;
use serde_json::json;
use speclib_common::Result;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Summary information returned after an import operation
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Materials created by this call; reused materials are not counted
    pub created_materials: usize,
    /// Spectra created by this call; every record yields exactly one
    pub created_spectra: usize,
    /// Parser warnings, in input order
    pub warnings: Vec<String>,
}

/// Progress observer invoked synchronously from the importing task:
/// once with (0, total) before persistence and once after each record
pub type ProgressCallback<'a> = &'a mut dyn FnMut(usize, usize);

/// Load files via importers and persist the resulting records
pub struct ImportService {
    db: SqlitePool,
    registry: ImporterRegistry,
}

impl ImportService {
    /// Create a service with the built-in importers
    pub fn new(db: SqlitePool) -> Self {
        Self::with_registry(db, ImporterRegistry::with_default_importers())
    }

    /// Create a service with a caller-assembled registry
    pub fn with_registry(db: SqlitePool, registry: ImporterRegistry) -> Self {
        Self { db, registry }
    }

    pub fn registry(&self) -> &ImporterRegistry {
        &self.registry
    }

    /// Import a file and persist its records
    pub async fn import_path(
        &self,
        path: &Path,
        context: &ImportContext,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ImportSummary> {
        let (summary, _) = self.import_impl(path, context, progress).await?;
        Ok(summary)
    }

    /// Import a file and additionally return the raw parse result, for
    /// callers that preview records alongside persistence
    pub async fn import_with_result(
        &self,
        path: &Path,
        context: &ImportContext,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<(ImportSummary, ImportResult)> {
        self.import_impl(path, context, progress).await
    }

    async fn import_impl(
        &self,
        path: &Path,
        context: &ImportContext,
        mut progress: Option<ProgressCallback<'_>>,
    ) -> Result<(ImportSummary, ImportResult)> {
        let (result, importer_name) = self.registry.import_file(path, context)?;

        let total_records = result.records.len();
        let mut processed_records = 0usize;
        if let Some(callback) = progress.as_mut() {
            callback(processed_records, total_records);
        }

        info!(
            path = %path.display(),
            importer = importer_name,
            records = total_records,
            "Importing spectra"
        );

        let sha256 = source_files::calculate_file_hash(path).await?;

        let mut created_materials = 0usize;
        let mut created_spectra = 0usize;

        // All records of one import commit or roll back together
        let mut tx = self.db.begin().await?;

        let source_file_id =
            get_or_create_source_file(&mut tx, path, &sha256, importer_name).await?;

        // Tag cache is scoped to this call so one batch never creates the
        // same tag twice; cross-call reuse goes through the table lookup
        let mut tag_cache: HashMap<String, i64> = HashMap::new();

        for record in &result.records {
            let (material_id, material_created) =
                get_or_create_material(&mut tx, record).await?;
            if material_created {
                created_materials += 1;
            }

            let spectrum_id = spectra::insert(
                &mut tx,
                &NewSpectrum {
                    material_id,
                    source_file_id: Some(source_file_id),
                    source: &record.source,
                    wavelength_unit: &record.wavelength_unit,
                    reflectance_unit: &record.reflectance_unit,
                    acquisition_date: record.acquisition_date,
                    quality_status: "complete",
                    plugin_id: None,
                    comments: record.comments.as_deref(),
                },
            )
            .await?;

            points::insert_series(&mut tx, spectrum_id, &record.wavelengths, &record.reflectance)
                .await?;
            apply_tags(&mut tx, spectrum_id, &record.tags, &mut tag_cache).await?;

            versions::insert(
                &mut tx,
                spectrum_id,
                1,
                Some("import"),
                &metadata_snapshot(record),
            )
            .await?;
            change_log::append(
                &mut tx,
                &NewChangeLogEntry {
                    entity_type: "spectrum",
                    entity_id: spectrum_id.to_string(),
                    action: "imported",
                    payload: Some(json!({ "material_id": material_id })),
                    user: None,
                    plugin_id: Some(importer_name),
                },
            )
            .await?;

            created_spectra += 1;
            processed_records += 1;
            if let Some(callback) = progress.as_mut() {
                callback(processed_records, total_records);
            }
        }

        tx.commit().await?;

        info!(
            path = %path.display(),
            created_materials,
            created_spectra,
            warnings = result.warnings.len(),
            "Import committed"
        );

        let summary = ImportSummary {
            created_materials,
            created_spectra,
            warnings: result.warnings.clone(),
        };

        Ok((summary, result))
    }
}

/// Find the source file by content hash, creating a row on first sight
async fn get_or_create_source_file(
    conn: &mut SqliteConnection,
    path: &Path,
    sha256: &str,
    importer_name: &str,
) -> Result<i64> {
    if let Some(existing) = source_files::find_by_sha256(conn, sha256).await? {
        debug!(sha256, id = existing.id, "Reusing existing source file");
        return Ok(existing.id);
    }

    let original_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "csv".to_string());

    let id = source_files::insert(
        conn,
        &NewSourceFile {
            original_name: &original_name,
            format: &format,
            sha256,
            importer_plugin: Some(importer_name),
            status: "success",
            notes: None,
        },
    )
    .await?;

    change_log::append(
        conn,
        &NewChangeLogEntry {
            entity_type: "source_file",
            entity_id: id.to_string(),
            action: "registered",
            payload: Some(json!({ "sha256": sha256 })),
            user: None,
            plugin_id: Some(importer_name),
        },
    )
    .await?;

    Ok(id)
}

/// Find the material by identity, creating it on first encounter. Existing
/// materials are refreshed: category always, location/comments only when the
/// record supplies a non-empty value.
async fn get_or_create_material(
    conn: &mut SqliteConnection,
    record: &SpectrumRecord,
) -> Result<(i64, bool)> {
    if let Some(existing) =
        materials::find_by_identity(conn, &record.library_name, &record.material_name).await?
    {
        materials::update_import_fields(
            conn,
            existing.id,
            &record.category,
            record.location.as_deref().filter(|value| !value.is_empty()),
            record.comments.as_deref().filter(|value| !value.is_empty()),
        )
        .await?;
        return Ok((existing.id, false));
    }

    let id = materials::insert(
        conn,
        &record.library_name,
        &record.material_name,
        &record.category,
        record.location.as_deref(),
        record.comments.as_deref(),
    )
    .await?;

    change_log::append(
        conn,
        &NewChangeLogEntry {
            entity_type: "material",
            entity_id: id.to_string(),
            action: "created",
            payload: Some(json!({
                "library_name": record.library_name,
                "material_name": record.material_name,
            })),
            user: None,
            plugin_id: None,
        },
    )
    .await?;

    Ok((id, true))
}

/// Resolve each tag string through the per-call cache, then the table,
/// creating on miss; finally link it to the spectrum
async fn apply_tags(
    conn: &mut SqliteConnection,
    spectrum_id: i64,
    record_tags: &[String],
    tag_cache: &mut HashMap<String, i64>,
) -> Result<()> {
    for tag_name in record_tags {
        let normalized = tag_name.trim();
        if normalized.is_empty() {
            continue;
        }

        let tag_id = match tag_cache.get(normalized) {
            Some(&id) => id,
            None => {
                let id = match tags::find_by_name(conn, normalized).await? {
                    Some(tag) => tag.id,
                    None => tags::insert(conn, normalized).await?,
                };
                tag_cache.insert(normalized.to_string(), id);
                id
            }
        };

        tags::attach(conn, spectrum_id, tag_id).await?;
    }

    Ok(())
}

/// Initial version snapshot recorded for every created spectrum
fn metadata_snapshot(record: &SpectrumRecord) -> serde_json::Value {
    json!({
        "source": record.source,
        "wavelength_unit": record.wavelength_unit,
        "reflectance_unit": record.reflectance_unit,
        "metadata": record.metadata,
        "tags": record.tags,
    })
}
