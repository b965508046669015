use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Minimum number of observations required to fit the forecasting model.
pub const MIN_DATA_POINTS: usize = 2;

/// A single cell of an uploaded table, typed at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value (empty field or a recognised NA marker).
    Empty,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl CellValue {
    /// Returns the numeric value for integer and float cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns true for integer and float cells.
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, "NaN"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One named column of a [`RawTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    /// Typed cells, one per data row.
    pub cells: Vec<CellValue>,
    /// Original (trimmed) field text, one per data row.
    #[serde(skip)]
    pub raw: Vec<String>,
}

/// An uploaded table: ordered named columns of equal length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTable {
    pub columns: Vec<Column>,
    pub row_count: usize,
    /// 1-based line in the uploaded file of each data row.
    #[serde(skip)]
    pub source_lines: Vec<usize>,
}

impl RawTable {
    /// Column names in header order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// File line of a data row. The header is line 1, so without skipped
    /// blank lines data row `i` sits on line `i + 2`.
    pub fn source_line(&self, row: usize) -> usize {
        self.source_lines.get(row).copied().unwrap_or(row + 2)
    }

    /// First `n` rows as a new table, for previews.
    pub fn head(&self, n: usize) -> RawTable {
        let take = n.min(self.row_count);
        RawTable {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    cells: c.cells[..take].to_vec(),
                    raw: c.raw[..take].to_vec(),
                })
                .collect(),
            row_count: take,
            source_lines: self.source_lines.iter().take(take).copied().collect(),
        }
    }
}

/// The user's choice of date and target columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub date_column: String,
    pub target_column: String,
}

impl ColumnSelection {
    pub fn new(date_column: impl Into<String>, target_column: impl Into<String>) -> Self {
        ColumnSelection {
            date_column: date_column.into(),
            target_column: target_column.into(),
        }
    }
}

/// A single (timestamp, value) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    #[serde(rename = "ds")]
    pub timestamp: NaiveDate,
    #[serde(rename = "y")]
    pub value: f64,
}

/// The model's training input: observations sorted ascending by timestamp.
/// Duplicate timestamps are allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalSeries {
    pub points: Vec<SeriesPoint>,
}

impl CanonicalSeries {
    /// Returns the number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the earliest timestamp, or None if empty.
    pub fn first_timestamp(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.timestamp)
    }

    /// Returns the latest timestamp, or None if empty.
    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.timestamp)
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// First `n` observations, for previews.
    pub fn head(&self, n: usize) -> CanonicalSeries {
        CanonicalSeries {
            points: self.points.iter().take(n).copied().collect(),
        }
    }
}

/// One row of model output: the point forecast, its uncertainty interval and
/// the additive components it is made of.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRecord {
    #[serde(rename = "ds")]
    pub timestamp: NaiveDate,
    #[serde(rename = "yhat")]
    pub point_forecast: f64,
    #[serde(rename = "yhat_lower")]
    pub lower_bound: f64,
    #[serde(rename = "yhat_upper")]
    pub upper_bound: f64,
    pub trend: f64,
    pub trend_lower: f64,
    pub trend_upper: f64,
    pub yearly: f64,
}
