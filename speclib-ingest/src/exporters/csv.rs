//! Delimited (CSV) exporter
//!
//! Writes records in the exact column layout the CSV importer reads, so an
//! exported file can be re-imported: required columns first, then the
//! optional columns, then one column per metadata key present in the payload.

use super::{ExportContext, ExportPayload, Exporter};
use crate::importers::SpectrumRecord;
use speclib_common::{Error, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub struct CsvSpectrumExporter;

impl Exporter for CsvSpectrumExporter {
    fn format_name(&self) -> &'static str {
        "csv"
    }

    fn export(&self, payload: &ExportPayload, _context: &ExportContext) -> Result<PathBuf> {
        let mut writer = csv::Writer::from_path(&payload.output_path)
            .map_err(|err| Error::Internal(format!("Unable to write CSV file: {err}")))?;

        let metadata_keys: BTreeSet<&str> = payload
            .spectra
            .iter()
            .flat_map(|record| record.metadata.keys())
            .map(String::as_str)
            .collect();

        let mut header = vec![
            "library_name",
            "material_name",
            "category",
            "source",
            "wavelength_unit",
            "reflectance_unit",
            "wavelengths",
            "reflectance",
            "location",
            "comments",
            "acquisition_date",
            "tags",
        ];
        header.extend(metadata_keys.iter().copied());
        writer
            .write_record(&header)
            .map_err(|err| Error::Internal(format!("Unable to write CSV header: {err}")))?;

        for record in &payload.spectra {
            let mut row = vec![
                record.library_name.clone(),
                record.material_name.clone(),
                record.category.clone(),
                record.source.clone(),
                record.wavelength_unit.clone(),
                record.reflectance_unit.clone(),
                join_series(&record.wavelengths),
                join_series(&record.reflectance),
                record.location.clone().unwrap_or_default(),
                record.comments.clone().unwrap_or_default(),
                record
                    .acquisition_date
                    .map(|date| date.to_string())
                    .unwrap_or_default(),
                record.tags.join(";"),
            ];
            for key in &metadata_keys {
                row.push(record.metadata.get(*key).cloned().unwrap_or_default());
            }
            writer
                .write_record(&row)
                .map_err(|err| Error::Internal(format!("Unable to write CSV row: {err}")))?;
        }

        writer
            .flush()
            .map_err(|err| Error::Internal(format!("Unable to flush CSV file: {err}")))?;

        Ok(payload.output_path.clone())
    }
}

fn join_series(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(";")
}
