//! Error taxonomy for a pipeline run.
//!
//! Every stage returns one of these kinds. None of them is fatal to the host:
//! the run stops at the failing stage and [`crate::pipeline::report`] turns the
//! error into a user-visible message.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while turning an upload into a forecast
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The upload could not be parsed as a CSV table
    #[error("Error reading the file: {0}")]
    Load(String),

    /// A selected column name is not present in the table
    #[error("Column '{column}' not found. Available columns: {}", available.join(", "))]
    Selection {
        column: String,
        available: Vec<String>,
    },

    /// A value in the date column is not a day-first calendar date
    ///
    /// `line` is the 1-based line of the uploaded file, header included.
    #[error("Line {line}: could not parse '{value}' as a date (expected dd/mm/yyyy)")]
    DateParse { line: usize, value: String },

    /// The target column is not uniformly numeric
    #[error(
        "Line {line}: the selected column '{column}' for 'y' is not numeric ('{value}'). \
         Please check your data."
    )]
    Type {
        column: String,
        line: usize,
        value: String,
    },

    /// Too few usable observations to fit the model
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Model fitting failed on degenerate input
    #[error("Model fitting failed: {0}")]
    Fit(String),

    /// The spreadsheet artifact could not be written
    #[error("Failed to build the spreadsheet: {0}")]
    Export(String),

    /// The pipeline configuration is not usable
    #[error("Invalid configuration '{name}': {reason}")]
    Config { name: String, reason: String },
}

impl PipelineError {
    /// Short, stable name of the error kind, useful for logging and display.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Load(_) => "LoadError",
            PipelineError::Selection { .. } => "SelectionError",
            PipelineError::DateParse { .. } => "DateParseError",
            PipelineError::Type { .. } => "TypeError",
            PipelineError::InsufficientData { .. } => "InsufficientDataError",
            PipelineError::Fit(_) => "FitError",
            PipelineError::Export(_) => "ExportError",
            PipelineError::Config { .. } => "ConfigError",
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for PipelineError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        PipelineError::Export(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_display_lists_columns() {
        let error = PipelineError::Selection {
            column: "Calls".to_string(),
            available: vec!["Date".to_string(), "Volume".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Column 'Calls' not found. Available columns: Date, Volume"
        );
    }

    #[test]
    fn test_insufficient_data_display() {
        let error = PipelineError::InsufficientData {
            required: 2,
            actual: 0,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient data: need at least 2 observations, got 0"
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(PipelineError::Load("x".into()).kind(), "LoadError");
        assert_eq!(PipelineError::Fit("x".into()).kind(), "FitError");
        assert_eq!(
            PipelineError::DateParse {
                line: 2,
                value: "x".into()
            }
            .kind(),
            "DateParseError"
        );
    }

    #[test]
    fn test_error_propagation() {
        fn inner() -> Result<i32> {
            Err(PipelineError::Fit("singular".to_string()))
        }
        fn outer() -> Result<i32> {
            inner()?;
            Ok(1)
        }
        assert_eq!(
            outer().unwrap_err(),
            PipelineError::Fit("singular".to_string())
        );
    }
}
