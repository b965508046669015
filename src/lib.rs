//! Monthly forecasting pipeline: a CSV upload with a date column and a
//! numeric target goes in, and a windowed forecast table, a spreadsheet and
//! plot data come out.
//!
//! ```no_run
//! use forecast_pipeline::{report, run, ColumnSelection, PipelineConfig};
//!
//! let bytes = std::fs::read("calls.csv").unwrap();
//! let selection = ColumnSelection::new("Date", "Calls");
//! match run(&bytes, &selection, &PipelineConfig::default()) {
//!     Ok(output) => print!("{}", output.export),
//!     Err(e) => eprintln!("{}", report(Err(e)).message().unwrap_or_default()),
//! }
//! ```
//!
//! The crate logs through `tracing` and never installs a subscriber.

pub mod common;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod pipeline;
pub mod seasonality;
pub mod series;
pub mod window;

pub use common::types::{
    CanonicalSeries, CellValue, ColumnSelection, ForecastRecord, RawTable, SeriesPoint,
};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use export::xlsx::SpreadsheetArtifact;
pub use export::{ExportRow, ExportTable};
pub use forecast::params::ModelConfig;
pub use forecast::{Cadence, FittedModel, ForecastEngine};
pub use pipeline::{report, run, ErrorReport, Pipeline, PipelineOutput, RunReport};
pub use series::SeriesWarning;
pub use window::ForecastWindow;
