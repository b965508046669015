use super::types::{CellValue, Column, RawTable};
use crate::error::{PipelineError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Field values read as missing.
const NA_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "<NA>"];

const TRUE_VALUES: &[&str] = &["True", "true", "TRUE"];
const FALSE_VALUES: &[&str] = &["False", "false", "FALSE"];

/// Read an uploaded CSV payload into a [`RawTable`].
///
/// The first record is the header. Every data record must have exactly as
/// many fields as the header. Any structural problem fails the whole load:
/// no partial table is returned.
pub fn read_table(bytes: &[u8]) -> Result<RawTable> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(PipelineError::Load("No columns to parse from file".to_string()));
    }
    if bytes.contains(&0) {
        return Err(PipelineError::Load(
            "File contains binary data (NUL bytes); expected comma-separated text".to_string(),
        ));
    }
    std::str::from_utf8(bytes)
        .map_err(|e| PipelineError::Load(format!("File is not valid UTF-8 text: {}", e)))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Load(format!("Failed to read header row: {}", e)))?
        .clone();

    if headers.is_empty() {
        return Err(PipelineError::Load("No columns to parse from file".to_string()));
    }

    let names = dedupe_header_names(headers.iter());
    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    let mut source_lines = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record = result
            .map_err(|e| PipelineError::Load(format!("Line {}: {}", idx + 2, e)))?;
        let line = record.position().map_or(idx + 2, |p| p.line() as usize);

        // Blank lines are skipped by the reader; a lone empty field is the same thing
        if record.len() == 1 && names.len() > 1 && record.get(0) == Some("") {
            continue;
        }
        if record.len() != names.len() {
            return Err(PipelineError::Load(format!(
                "Line {}: expected {} fields, saw {}",
                line,
                names.len(),
                record.len()
            )));
        }

        source_lines.push(line);
        for (col, field) in raw_columns.iter_mut().zip(record.iter()) {
            col.push(field.to_string());
        }
    }

    let row_count = raw_columns.first().map(Vec::len).unwrap_or(0);
    let columns: Vec<Column> = names
        .into_iter()
        .zip(raw_columns)
        .map(|(name, raw)| Column {
            name,
            cells: raw.iter().map(|s| infer_cell(s.as_str())).collect(),
            raw,
        })
        .collect();

    debug!(
        columns = columns.len(),
        rows = row_count,
        "loaded uploaded table"
    );

    Ok(RawTable {
        columns,
        row_count,
        source_lines,
    })
}

/// Type a single trimmed field.
pub fn infer_cell(field: &str) -> CellValue {
    if NA_VALUES.contains(&field) {
        return CellValue::Empty;
    }
    if TRUE_VALUES.contains(&field) {
        return CellValue::Boolean(true);
    }
    if FALSE_VALUES.contains(&field) {
        return CellValue::Boolean(false);
    }
    if let Ok(i) = field.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if looks_like_float(field) {
        if let Ok(f) = field.parse::<f64>() {
            return CellValue::Float(f);
        }
    }
    CellValue::Text(field.to_string())
}

/// Rust's float parser also accepts words like "inf" and "infinity"; only
/// digit-based literals count as numbers here.
fn looks_like_float(field: &str) -> bool {
    field.bytes().any(|b| b.is_ascii_digit())
        && field
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}

/// Make header names unique: repeats become `name.1`, `name.2`, …; blanks
/// become `Unnamed: <index>`.
fn dedupe_header_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (idx, header) in headers.enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }

    names
}
