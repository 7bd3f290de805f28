//! Delimited (CSV) importer
//!
//! Expects a header row with the required spectral columns; numeric series
//! are packed into single fields joined by semicolons. Rows are processed
//! independently: a malformed row becomes one warning and is skipped.

use super::{ImportContext, ImportResult, Importer, RowError, SpectrumRecord};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use speclib_common::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Column names that must be present in the header row
const REQUIRED_COLUMNS: [&str; 8] = [
    "library_name",
    "material_name",
    "category",
    "source",
    "wavelength_unit",
    "reflectance_unit",
    "wavelengths",
    "reflectance",
];

/// Optional columns consumed during parsing; everything else is metadata
const RESERVED_COLUMNS: [&str; 4] = ["location", "comments", "acquisition_date", "tags"];

/// Parse spectral records from CSV files with semicolon-delimited series
pub struct CsvSpectrumImporter;

impl Importer for CsvSpectrumImporter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn formats(&self) -> &'static [&'static str] {
        &["csv"]
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn load(&self, path: &Path, context: &ImportContext) -> Result<ImportResult> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|err| Error::Import(format!("Unable to read CSV file: {err}")))?;

        let headers = reader
            .headers()
            .map_err(|err| Error::Import(format!("Unable to read CSV header: {err}")))?
            .clone();
        ensure_required_columns(&headers)?;

        let columns: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name, index))
            .collect();

        let mut result = ImportResult::default();
        for (offset, row) in reader.records().enumerate() {
            let row_number = offset + 2; // header is row 1
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    result.warnings.push(format!("Row {row_number}: {err}"));
                    continue;
                }
            };

            let record = match build_record(&headers, &columns, &row, context) {
                Ok(record) => record,
                Err(err) => {
                    result.warnings.push(format!("Row {row_number}: {err}"));
                    continue;
                }
            };

            if let Err(err) = record.validate() {
                result.warnings.push(format!("Row {row_number}: {err}"));
                continue;
            }

            result.records.push(record);
        }

        Ok(result)
    }
}

fn ensure_required_columns(headers: &StringRecord) -> Result<()> {
    if headers.is_empty() {
        return Err(Error::Import("CSV file is missing a header row".to_string()));
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !headers.iter().any(|header| header == **name))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(Error::Import(format!(
            "CSV file missing required columns: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

fn build_record(
    headers: &StringRecord,
    columns: &HashMap<&str, usize>,
    row: &StringRecord,
    context: &ImportContext,
) -> std::result::Result<SpectrumRecord, RowError> {
    let library_name = match context.target_library.as_deref() {
        Some(library) if !library.trim().is_empty() => library.trim().to_string(),
        _ => cell(columns, row, "library_name").trim().to_string(),
    };
    if library_name.is_empty() {
        return Err(RowError("library_name is required".to_string()));
    }

    let material_name = cell(columns, row, "material_name").trim().to_string();
    let category = cell(columns, row, "category").trim().to_string();
    let source = cell(columns, row, "source").trim().to_string();
    let wavelength_unit = cell(columns, row, "wavelength_unit").trim().to_string();
    let reflectance_unit = cell(columns, row, "reflectance_unit").trim().to_string();

    if material_name.is_empty() || category.is_empty() || source.is_empty() {
        return Err(RowError(
            "material_name, category, and source are required".to_string(),
        ));
    }
    if wavelength_unit.is_empty() || reflectance_unit.is_empty() {
        return Err(RowError(
            "wavelength_unit and reflectance_unit are required".to_string(),
        ));
    }

    let wavelengths = parse_float_series(cell(columns, row, "wavelengths"))?;
    let reflectance = parse_float_series(cell(columns, row, "reflectance"))?;

    let location = non_empty(cell(columns, row, "location"));
    let comments = non_empty(cell(columns, row, "comments"));
    let acquisition_date = parse_date(cell(columns, row, "acquisition_date"))?;
    let tags = parse_tags(cell(columns, row, "tags"));

    let mut metadata = std::collections::BTreeMap::new();
    for (index, name) in headers.iter().enumerate() {
        if REQUIRED_COLUMNS.contains(&name) || RESERVED_COLUMNS.contains(&name) {
            continue;
        }
        if let Some(value) = row.get(index) {
            if !value.is_empty() {
                metadata.insert(name.to_string(), value.to_string());
            }
        }
    }

    Ok(SpectrumRecord {
        library_name,
        material_name,
        category,
        source,
        wavelength_unit,
        reflectance_unit,
        wavelengths,
        reflectance,
        location,
        acquisition_date,
        comments,
        metadata,
        tags,
    })
}

/// Look up a row value by column name; missing cells read as empty
fn cell<'r>(columns: &HashMap<&str, usize>, row: &'r StringRecord, name: &str) -> &'r str {
    columns
        .get(name)
        .and_then(|&index| row.get(index))
        .unwrap_or("")
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn parse_float_series(raw: &str) -> std::result::Result<Vec<f64>, RowError> {
    let mut values = Vec::new();
    for token in raw.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let value: f64 = token
            .parse()
            .map_err(|_| RowError(format!("invalid numeric value '{token}' in series")))?;
        values.push(value);
    }

    if values.is_empty() {
        return Err(RowError("series must contain at least one value".to_string()));
    }

    Ok(values)
}

fn parse_date(raw: &str) -> std::result::Result<Option<NaiveDate>, RowError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| RowError(format!("invalid acquisition_date: {raw}")))
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
