//! Instrument ASCII importer (ASD SIG/TXT exports)
//!
//! Input is loosely structured text: free-form `key = value` / `key : value`
//! metadata lines followed by a whitespace-delimited data table. The boundary
//! is the first line containing "wavelength" (case-insensitive), which is
//! treated as the column header row. Decoding is tolerant of invalid bytes.

use super::{ImportContext, ImportResult, Importer, SpectrumRecord};
use speclib_common::{Error, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Library name used when the file does not declare one
const DEFAULT_LIBRARY: &str = "ASD Imports";

/// Content tokens identifying an instrument export during the sniff
const SNIFF_TOKENS: [&str; 3] = ["asd", "fieldspec", "spectravista"];

/// Bytes of file prefix inspected by `can_handle`
const SNIFF_PREFIX_BYTES: u64 = 4096;

/// Metadata keys consumed while deriving record fields; everything else is
/// kept in the record's metadata map
const CONSUMED_KEYS: [&str; 7] = [
    "Library",
    "Sample",
    "Target",
    "Category",
    "Instrument",
    "Device",
    "Comments",
];

/// Parse ASD ASCII exports (SIG/TXT) into spectrum records
pub struct AsdAsciiImporter;

/// Numeric series extracted from the data section
struct NumericRows {
    wavelengths: Vec<f64>,
    reflectance: Vec<f64>,
    radiance: Vec<f64>,
    warnings: Vec<String>,
}

impl Importer for AsdAsciiImporter {
    fn name(&self) -> &'static str {
        "asd_ascii"
    }

    fn formats(&self) -> &'static [&'static str] {
        &["sig", "txt"]
    }

    fn can_handle(&self, path: &Path) -> bool {
        let is_candidate = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("sig") || ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if !is_candidate {
            return false;
        }

        let Ok(file) = std::fs::File::open(path) else {
            return false;
        };
        let mut prefix = Vec::new();
        if file.take(SNIFF_PREFIX_BYTES).read_to_end(&mut prefix).is_err() {
            return false;
        }

        let head = String::from_utf8_lossy(&prefix)
            .lines()
            .take(5)
            .collect::<Vec<_>>()
            .join("\n")
            .to_lowercase();
        SNIFF_TOKENS.iter().any(|token| head.contains(token))
    }

    fn load(&self, path: &Path, context: &ImportContext) -> Result<ImportResult> {
        let bytes = std::fs::read(path)
            .map_err(|err| Error::Import(format!("Unable to read ASD file: {err}")))?;
        let text = String::from_utf8_lossy(&bytes);

        let (metadata, column_names, data_lines) = split_sections(text.lines());
        if column_names.is_empty() {
            return Err(Error::Import(
                "Unable to locate ASD data columns (expected a header row containing 'Wavelength')"
                    .to_string(),
            ));
        }

        let NumericRows {
            wavelengths,
            reflectance,
            radiance,
            mut warnings,
        } = parse_numeric_rows(&column_names, &data_lines)?;

        let library_name = context
            .target_library
            .clone()
            .filter(|value| !value.is_empty())
            .or_else(|| metadata_value(&metadata, "Library"))
            .unwrap_or_else(|| DEFAULT_LIBRARY.to_string());

        let material_name = context
            .extra_options
            .get("material_name")
            .cloned()
            .filter(|value| !value.is_empty())
            .or_else(|| metadata_value(&metadata, "Sample"))
            .or_else(|| metadata_value(&metadata, "Target"))
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });

        let category = metadata_value(&metadata, "Category").unwrap_or_else(|| "Field".to_string());

        let instrument = metadata_value(&metadata, "Instrument")
            .or_else(|| metadata_value(&metadata, "Device"))
            .unwrap_or_else(|| "ASD Spectrometer".to_string());
        let source = match metadata_value(&metadata, "Integration Time") {
            Some(integration) => format!("{instrument} (Integration {integration})"),
            None => instrument,
        };

        let mut reflectance_unit = if reflectance.is_empty() { "radiance" } else { "ratio" }.to_string();
        let reflectance_values = if reflectance.is_empty() {
            if radiance.is_empty() {
                return Err(Error::Import(
                    "ASD file did not contain reflectance or radiance data columns".to_string(),
                ));
            }
            reflectance_unit = "radiance".to_string();
            warnings.push("Reflectance column missing - radiance values stored instead.".to_string());
            radiance
        } else {
            reflectance
        };

        let record = SpectrumRecord {
            library_name,
            material_name,
            category,
            source,
            wavelength_unit: metadata_value(&metadata, "Wavelength Unit")
                .unwrap_or_else(|| "nm".to_string()),
            reflectance_unit,
            wavelengths,
            reflectance: reflectance_values,
            location: metadata_value(&metadata, "Location"),
            acquisition_date: None,
            comments: metadata_value(&metadata, "Comments"),
            tags: build_tags(&metadata),
            metadata: metadata
                .into_iter()
                .filter(|(key, _)| !CONSUMED_KEYS.contains(&key.as_str()))
                .collect(),
        };

        if let Err(err) = record.validate() {
            warnings.push(err.to_string());
        }

        Ok(ImportResult {
            records: vec![record],
            warnings,
        })
    }
}

fn metadata_value(metadata: &BTreeMap<String, String>, key: &str) -> Option<String> {
    metadata.get(key).filter(|value| !value.is_empty()).cloned()
}

/// Split input lines into metadata entries, the column header row, and data
/// rows. Blank lines are skipped everywhere.
fn split_sections<'a>(
    lines: impl Iterator<Item = &'a str>,
) -> (BTreeMap<String, String>, Vec<String>, Vec<String>) {
    let mut metadata = BTreeMap::new();
    let mut column_names: Vec<String> = Vec::new();
    let mut data_lines: Vec<String> = Vec::new();
    let mut in_data = false;

    for line in lines {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        if !in_data && stripped.to_lowercase().contains("wavelength") {
            column_names = stripped
                .replace('\t', " ")
                .split_whitespace()
                .map(str::to_string)
                .collect();
            in_data = true;
            continue;
        }
        if in_data {
            data_lines.push(stripped.to_string());
        } else if let Some((key, value)) = split_metadata_line(stripped) {
            metadata.insert(key, value);
        }
    }

    (metadata, column_names, data_lines)
}

fn split_metadata_line(line: &str) -> Option<(String, String)> {
    for delimiter in ['=', ':'] {
        if let Some((key, value)) = line.split_once(delimiter) {
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            return Some((title_case(key), value.trim().to_string()));
        }
    }
    None
}

/// Normalize a metadata key to title case ("integration time" ->
/// "Integration Time", "INSTRUMENT" -> "Instrument")
fn title_case(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                normalized.extend(ch.to_uppercase());
            } else {
                normalized.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            normalized.push(ch);
            at_word_start = true;
        }
    }
    normalized
}

fn parse_numeric_rows(column_names: &[String], data_lines: &[String]) -> Result<NumericRows> {
    let find_column = |candidates: &[&str]| -> Option<usize> {
        for candidate in candidates {
            for (index, name) in column_names.iter().enumerate() {
                if name.to_lowercase().contains(candidate) {
                    return Some(index);
                }
            }
        }
        None
    };

    // Column roles by substring match, in priority order
    let wavelength_index = find_column(&["wavelength"])
        .ok_or_else(|| Error::Import("ASD data missing wavelength column".to_string()))?;
    let reflectance_index = find_column(&["reflectance", "ratio"]);
    let radiance_index = find_column(&["radiance", "sample"]);

    let mut rows = NumericRows {
        wavelengths: Vec::new(),
        reflectance: Vec::new(),
        radiance: Vec::new(),
        warnings: Vec::new(),
    };

    // A row must supply every resolved column; otherwise it is dropped whole,
    // keeping the collected series parallel.
    let last_required_index = [Some(wavelength_index), reflectance_index, radiance_index]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(wavelength_index);

    for (offset, line) in data_lines.iter().enumerate() {
        let row_number = offset + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() <= last_required_index {
            rows.warnings.push(format!("Row {row_number}: insufficient columns."));
            continue;
        }

        let wavelength: f64 = match parts[wavelength_index].parse() {
            Ok(value) => value,
            Err(_) => {
                rows.warnings.push(format!(
                    "Row {row_number}: invalid wavelength value '{}'",
                    parts[wavelength_index]
                ));
                continue;
            }
        };

        let mut row_reflectance = None;
        if let Some(index) = reflectance_index {
            match parts[index].parse::<f64>() {
                Ok(value) => row_reflectance = Some(value),
                Err(_) => {
                    rows.warnings.push(format!(
                        "Row {row_number}: invalid reflectance value '{}'",
                        parts[index]
                    ));
                    continue;
                }
            }
        }

        let mut row_radiance = None;
        if let Some(index) = radiance_index {
            match parts[index].parse::<f64>() {
                Ok(value) => row_radiance = Some(value),
                Err(_) => {
                    rows.warnings.push(format!(
                        "Row {row_number}: invalid radiance value '{}'",
                        parts[index]
                    ));
                    continue;
                }
            }
        }

        rows.wavelengths.push(wavelength);
        if let Some(value) = row_reflectance {
            rows.reflectance.push(value);
        }
        if let Some(value) = row_radiance {
            rows.radiance.push(value);
        }
    }

    Ok(rows)
}

/// Derive synthetic tags from instrument metadata
fn build_tags(metadata: &BTreeMap<String, String>) -> Vec<String> {
    let mut tags = vec!["asd".to_string()];
    if let Some(instrument) =
        metadata_value(metadata, "Instrument").or_else(|| metadata_value(metadata, "Device"))
    {
        tags.push(instrument.to_lowercase().replace(' ', "-"));
    }
    if let Some(units) = metadata_value(metadata, "Units") {
        tags.push(units.to_lowercase());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    const FULL_EXPORT: &str = "\
ASD FieldSpec export
Instrument = ASD FieldSpec 4
Sample = Basalt-01
Integration Time = 100ms
Units: counts
Location: Iceland

Wavelength\tReflectance\tRadiance
400.0\t0.10\t123.0
500.0\t0.20\t456.0
";

    #[test]
    fn can_handle_requires_extension_and_token() {
        let dir = TempDir::new().unwrap();
        let importer = AsdAsciiImporter;

        let with_token = write_fixture(&dir, "scan.sig", FULL_EXPORT);
        assert!(importer.can_handle(&with_token));

        let no_token = write_fixture(&dir, "notes.txt", "just some notes\nnothing else\n");
        assert!(!importer.can_handle(&no_token));

        let wrong_extension = write_fixture(&dir, "scan.csv", FULL_EXPORT);
        assert!(!importer.can_handle(&wrong_extension));
    }

    #[test]
    fn parses_metadata_and_series() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "scan.sig", FULL_EXPORT);

        let result = AsdAsciiImporter
            .load(&path, &ImportContext::default())
            .unwrap();

        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.library_name, "ASD Imports");
        assert_eq!(record.material_name, "Basalt-01");
        assert_eq!(record.category, "Field");
        assert_eq!(record.source, "ASD FieldSpec 4 (Integration 100ms)");
        assert_eq!(record.wavelength_unit, "nm");
        assert_eq!(record.reflectance_unit, "ratio");
        assert_eq!(record.wavelengths, vec![400.0, 500.0]);
        assert_eq!(record.reflectance, vec![0.10, 0.20]);
        assert_eq!(record.location.as_deref(), Some("Iceland"));
        assert_eq!(
            record.tags,
            vec!["asd".to_string(), "asd-fieldspec-4".to_string(), "counts".to_string()]
        );
        // Consumed keys are dropped from metadata; the rest are kept
        assert!(!record.metadata.contains_key("Instrument"));
        assert!(!record.metadata.contains_key("Sample"));
        assert_eq!(
            record.metadata.get("Integration Time").map(String::as_str),
            Some("100ms")
        );
        assert_eq!(record.metadata.get("Units").map(String::as_str), Some("counts"));
    }

    #[test]
    fn metadata_keys_are_title_cased() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(
            &dir,
            "scan.sig",
            "asd export\ninstrument = FieldSpec\nINTEGRATION TIME = 50ms\nWavelength Sample\n400.0 12.0\n",
        );

        let result = AsdAsciiImporter
            .load(&path, &ImportContext::default())
            .unwrap();

        let record = &result.records[0];
        assert_eq!(record.source, "FieldSpec (Integration 50ms)");
    }

    #[test]
    fn radiance_substituted_when_reflectance_missing() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(
            &dir,
            "radiance_only.sig",
            "ASD FieldSpec export\nInstrument = ASD FieldSpec 4\nWavelength\tRadiance\n400.0\t123.0\n500.0\t456.0\n",
        );

        let result = AsdAsciiImporter
            .load(&path, &ImportContext::default())
            .unwrap();

        let record = &result.records[0];
        assert_eq!(record.reflectance_unit, "radiance");
        assert_eq!(record.reflectance, vec![123.0, 456.0]);
        assert!(result
            .warnings
            .iter()
            .any(|warning| warning.contains("Reflectance column missing")));
    }

    #[test]
    fn file_without_data_header_is_hard_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "no_data.sig", "ASD export\nInstrument = FieldSpec\n");

        let err = AsdAsciiImporter
            .load(&path, &ImportContext::default())
            .unwrap_err();

        match err {
            Error::Import(message) => assert!(message.contains("data columns"), "{message}"),
            other => panic!("expected Import error, got {other:?}"),
        }
    }

    #[test]
    fn file_without_any_series_is_hard_failure() {
        let dir = TempDir::new().unwrap();
        // Header resolves a wavelength column only; no reflectance or radiance
        let path = write_fixture(
            &dir,
            "empty.sig",
            "ASD export\nWavelength\n400.0\n500.0\n",
        );

        let err = AsdAsciiImporter
            .load(&path, &ImportContext::default())
            .unwrap_err();

        match err {
            Error::Import(message) => {
                assert!(message.contains("reflectance or radiance"), "{message}")
            }
            other => panic!("expected Import error, got {other:?}"),
        }
    }

    #[test]
    fn bad_cell_drops_whole_row() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(
            &dir,
            "partial.sig",
            "ASD export\nWavelength\tReflectance\n400.0\t0.10\n500.0\tbogus\n600.0\t0.30\n",
        );

        let result = AsdAsciiImporter
            .load(&path, &ImportContext::default())
            .unwrap();

        let record = &result.records[0];
        // Row 2 is dropped entirely; series stay parallel
        assert_eq!(record.wavelengths, vec![400.0, 600.0]);
        assert_eq!(record.reflectance, vec![0.10, 0.30]);
        assert_eq!(result.warnings.len(), 1);
        assert!(
            result.warnings[0].contains("Row 2") && result.warnings[0].contains("invalid reflectance"),
            "{}",
            result.warnings[0]
        );
    }

    #[test]
    fn short_row_warns_and_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(
            &dir,
            "short.sig",
            "ASD export\nWavelength\tReflectance\n400.0\t0.10\n500.0\n",
        );

        let result = AsdAsciiImporter
            .load(&path, &ImportContext::default())
            .unwrap();

        let record = &result.records[0];
        assert_eq!(record.wavelengths, vec![400.0]);
        assert!(result.warnings[0].contains("insufficient columns"));
    }

    #[test]
    fn material_falls_back_to_file_stem() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(
            &dir,
            "plot7_scan.sig",
            "ASD export\nWavelength Reflectance\n400.0 0.10\n",
        );

        let result = AsdAsciiImporter
            .load(&path, &ImportContext::default())
            .unwrap();

        assert_eq!(result.records[0].material_name, "plot7_scan");
        assert_eq!(result.records[0].source, "ASD Spectrometer");
    }

    #[test]
    fn context_overrides_library_and_material() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "scan.sig", FULL_EXPORT);

        let mut context = ImportContext {
            target_library: Some("Field Campaign 2024".to_string()),
            ..Default::default()
        };
        context
            .extra_options
            .insert("material_name".to_string(), "Basalt Override".to_string());

        let result = AsdAsciiImporter.load(&path, &context).unwrap();

        assert_eq!(result.records[0].library_name, "Field Campaign 2024");
        assert_eq!(result.records[0].material_name, "Basalt Override");
    }
}
