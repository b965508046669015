//! The upload-to-export pipeline.
//!
//! Stages run in a fixed order and each one hands an owned value to the next:
//! load, validate, prepare, fit, forecast, window, export. The first failing
//! stage ends the run; [`report`] is the single place errors become
//! user-facing messages.

use chrono::Datelike;
use serde::Serialize;
use tracing::{error, info};

use crate::common::table_reader::read_table;
use crate::common::types::{CanonicalSeries, ColumnSelection, ForecastRecord, RawTable};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::figures::{ComponentsFigure, ForecastFigure};
use crate::export::xlsx::{write_workbook, SpreadsheetArtifact};
use crate::export::{build_export, ExportTable};
use crate::forecast::{Cadence, ForecastEngine};
use crate::series::{prepare, validate, SeriesWarning};
use crate::window::ForecastWindow;

/// Everything a run produces for display and download.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// First rows of the uploaded table.
    pub raw_preview: RawTable,
    /// First rows of the canonical series.
    pub series_preview: CanonicalSeries,
    /// The whole forecast: history plus future periods.
    pub forecast: Vec<ForecastRecord>,
    pub window: ForecastWindow,
    /// Forecast records inside the window.
    pub windowed: Vec<ForecastRecord>,
    pub export: ExportTable,
    pub spreadsheet: SpreadsheetArtifact,
    pub forecast_figure: ForecastFigure,
    pub components_figure: ComponentsFigure,
    pub warnings: Vec<SeriesWarning>,
}

/// A configured pipeline. Holds no per-run state, so one instance can serve
/// any number of independent runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    engine: ForecastEngine,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let engine = ForecastEngine::new(config.model_config())?;
        Ok(Pipeline { config, engine })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on an uploaded CSV file.
    pub fn run(&self, bytes: &[u8], selection: &ColumnSelection) -> Result<PipelineOutput> {
        let table = load_table(bytes)?;
        self.run_with_table(&table, selection)
    }

    /// Run the stages after loading on an already parsed table.
    pub fn run_with_table(
        &self,
        table: &RawTable,
        selection: &ColumnSelection,
    ) -> Result<PipelineOutput> {
        let raw_preview = table.head(self.config.preview_rows);

        let validated = validate(table, selection)?;
        let (series, warnings) = prepare(&validated);

        let model = self.engine.fit(&series)?;
        let forecast = self
            .engine
            .forecast(&model, self.config.periods_ahead, Cadence::MonthStart)?;

        let window = ForecastWindow::for_series(
            &series,
            self.config.months_back,
            self.config.months_forward,
        )?;
        let windowed = window.select(&forecast);
        let export = build_export(&windowed);
        let spreadsheet = write_workbook(&export)?;

        let forecast_figure =
            ForecastFigure::new(&series, &forecast, &window, &selection.target_column);
        let reference_year = series
            .last_timestamp()
            .map(|d| d.year())
            .unwrap_or(window.end.year());
        let components_figure = ComponentsFigure::new(&forecast, &model, reference_year);

        info!(
            rows = table.row_count,
            observations = series.len(),
            forecast = forecast.len(),
            exported = export.len(),
            window_start = %window.start,
            window_end = %window.end,
            "pipeline run complete"
        );

        Ok(PipelineOutput {
            raw_preview,
            series_preview: series.head(self.config.preview_rows),
            forecast,
            window,
            windowed,
            export,
            spreadsheet,
            forecast_figure,
            components_figure,
            warnings,
        })
    }
}

/// Parse uploaded bytes into a table.
pub fn load_table(bytes: &[u8]) -> Result<RawTable> {
    read_table(bytes)
}

/// One-shot run with the given configuration.
pub fn run(
    bytes: &[u8],
    selection: &ColumnSelection,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    Pipeline::new(config.clone())?.run(bytes, selection)
}

/// Outcome of a run as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    Success(Box<PipelineOutput>),
    Failure(ErrorReport),
}

/// A failed run: the error kind and the message to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self, RunReport::Success(_))
    }

    /// The message to display, if the run failed.
    pub fn message(&self) -> Option<&str> {
        match self {
            RunReport::Success(_) => None,
            RunReport::Failure(report) => Some(&report.message),
        }
    }
}

/// Turn a run result into something the host can always display.
pub fn report(result: Result<PipelineOutput>) -> RunReport {
    match result {
        Ok(output) => RunReport::Success(Box::new(output)),
        Err(e) => {
            error!(kind = e.kind(), error = %e, "pipeline run failed");
            RunReport::Failure(ErrorReport {
                kind: e.kind().to_string(),
                message: e.to_string(),
            })
        }
    }
}
