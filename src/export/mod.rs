//! Presentation table for the windowed forecast.
//!
//! The same rows feed the on-screen table and the spreadsheet download.

pub mod figures;
pub mod xlsx;

use serde::Serialize;
use std::fmt;

use crate::common::calendar::format_day_first;
use crate::common::types::ForecastRecord;

/// Column headers of the export table, in order.
pub const HEADERS: [&str; 4] = ["Date", "yhat", "yhat_lower", "yhat_upper"];

/// One exported forecast row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    /// `dd/mm/yyyy`
    #[serde(rename = "Date")]
    pub formatted_date: String,
    #[serde(rename = "yhat")]
    pub point_forecast: f64,
    #[serde(rename = "yhat_lower")]
    pub lower_bound: f64,
    #[serde(rename = "yhat_upper")]
    pub upper_bound: f64,
}

impl From<&ForecastRecord> for ExportRow {
    fn from(record: &ForecastRecord) -> Self {
        ExportRow {
            formatted_date: format_day_first(record.timestamp),
            point_forecast: record.point_forecast,
            lower_bound: record.lower_bound,
            upper_bound: record.upper_bound,
        }
    }
}

/// Rows of the export table, ascending by date.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ExportTable {
    pub rows: Vec<ExportRow>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Convert windowed records into export rows, keeping their order.
pub fn build_export(records: &[ForecastRecord]) -> ExportTable {
    ExportTable {
        rows: records.iter().map(ExportRow::from).collect(),
    }
}

impl fmt::Display for ExportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|row| {
                [
                    row.formatted_date.clone(),
                    format!("{:.6}", row.point_forecast),
                    format!("{:.6}", row.lower_bound),
                    format!("{:.6}", row.upper_bound),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.len());
            }
        }

        for (i, header) in HEADERS.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{:>width$}", header, width = widths[i])?;
        }
        writeln!(f)?;
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:>width$}", cell, width = widths[i])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
