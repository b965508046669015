use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::debug;

use super::{ExportTable, HEADERS};
use crate::error::Result;

pub const SHEET_NAME: &str = "Forecast";
pub const FILE_NAME: &str = "forecast.xlsx";
pub const MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A downloadable spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadsheetArtifact {
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Write the export table to an in-memory workbook with a single
/// "Forecast" sheet: a header row, then one row per export row.
/// Non-finite numbers are left as empty cells.
pub fn write_workbook(table: &ExportTable) -> Result<SpreadsheetArtifact> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    worksheet.set_column_width(0, 12)?;

    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.formatted_date)?;
        let numbers = [row.point_forecast, row.lower_bound, row.upper_bound];
        for (offset, value) in numbers.iter().enumerate() {
            if value.is_finite() {
                worksheet.write_number(r, (offset + 1) as u16, *value)?;
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(rows = table.len(), bytes = bytes.len(), "spreadsheet written");

    Ok(SpreadsheetArtifact {
        file_name: FILE_NAME.to_string(),
        mime_type: MIME_TYPE.to_string(),
        bytes,
    })
}
