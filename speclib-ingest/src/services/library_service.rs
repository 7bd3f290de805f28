//! Library browser query service
//!
//! Read-only projection of stored materials and spectra into the display
//! hierarchy. This path only feeds a UI refresh, so storage failures degrade
//! to an empty tree instead of propagating.

use crate::db::{materials, spectra};
use chrono::NaiveDate;
use serde::Serialize;
use speclib_common::db::models::Spectrum;
use speclib_common::Result;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Lightweight descriptor for spectrum entries in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumNode {
    pub id: i64,
    pub label: String,
    pub source: String,
    pub acquisition_date: Option<NaiveDate>,
    pub quality_status: String,
}

/// Material entry including its spectra
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialNode {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub spectra: Vec<SpectrumNode>,
}

/// Top-level library grouping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryNode {
    pub name: String,
    pub materials: Vec<MaterialNode>,
}

/// Compose library/material/spectrum data for display
pub struct LibraryBrowserService {
    db: SqlitePool,
}

impl LibraryBrowserService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Return the hierarchy of available materials and spectra.
    ///
    /// Libraries sort ascending by name; materials keep the underlying
    /// (library_name, material_name) query order; spectra with a known
    /// acquisition date come first, chronologically, then the rest by id.
    pub async fn fetch_library_tree(&self) -> Vec<LibraryNode> {
        match self.load_tree().await {
            Ok(tree) => tree,
            Err(err) => {
                debug!(error = %err, "Failed to fetch library tree");
                Vec::new()
            }
        }
    }

    async fn load_tree(&self) -> Result<Vec<LibraryNode>> {
        // Two whole-table queries instead of one query per material
        let all_materials = materials::load_all(&self.db).await?;
        let all_spectra = spectra::load_all(&self.db).await?;

        let mut spectra_by_material: HashMap<i64, Vec<Spectrum>> = HashMap::new();
        for spectrum in all_spectra {
            spectra_by_material
                .entry(spectrum.material_id)
                .or_default()
                .push(spectrum);
        }

        let mut grouped: BTreeMap<String, Vec<MaterialNode>> = BTreeMap::new();
        for material in all_materials {
            let mut material_spectra = spectra_by_material
                .remove(&material.id)
                .unwrap_or_default();
            material_spectra.sort_by_key(|spectrum| {
                (
                    spectrum.acquisition_date.is_none(),
                    spectrum.acquisition_date,
                    spectrum.id,
                )
            });

            let nodes = material_spectra
                .into_iter()
                .map(|spectrum| SpectrumNode {
                    label: spectrum_label(&spectrum),
                    id: spectrum.id,
                    source: spectrum.source,
                    acquisition_date: spectrum.acquisition_date,
                    quality_status: spectrum.quality_status,
                })
                .collect();

            grouped
                .entry(material.library_name)
                .or_default()
                .push(MaterialNode {
                    id: material.id,
                    name: material.material_name,
                    category: material.category,
                    spectra: nodes,
                });
        }

        Ok(grouped
            .into_iter()
            .map(|(name, library_materials)| LibraryNode {
                name,
                materials: library_materials,
            })
            .collect())
    }
}

fn spectrum_label(spectrum: &Spectrum) -> String {
    match spectrum.acquisition_date {
        Some(date) => format!("{} · {}", spectrum.source, date),
        None => format!("{} · #{}", spectrum.source, spectrum.id),
    }
}
