//! The display window around the end of the history.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::common::calendar::shift_months;
use crate::common::types::{CanonicalSeries, ForecastRecord, MIN_DATA_POINTS};
use crate::error::{PipelineError, Result};

/// Closed date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ForecastWindow {
    /// Window from `months_back` calendar months before `last` to
    /// `months_forward` months after it. Days missing from the target month
    /// clamp to its last day.
    pub fn around(last: NaiveDate, months_back: u32, months_forward: u32) -> Result<Self> {
        let out_of_range = || PipelineError::Config {
            name: "window".to_string(),
            reason: format!("window around {} leaves the supported date range", last),
        };
        let back = i32::try_from(months_back).map_err(|_| out_of_range())?;
        let forward = i32::try_from(months_forward).map_err(|_| out_of_range())?;

        let start = shift_months(last, -back).ok_or_else(out_of_range)?;
        let end = shift_months(last, forward).ok_or_else(out_of_range)?;
        Ok(ForecastWindow { start, end })
    }

    /// Window anchored on the last timestamp of `series`.
    pub fn for_series(
        series: &CanonicalSeries,
        months_back: u32,
        months_forward: u32,
    ) -> Result<Self> {
        let last = series
            .last_timestamp()
            .ok_or(PipelineError::InsufficientData {
                required: MIN_DATA_POINTS,
                actual: 0,
            })?;
        Self::around(last, months_back, months_forward)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Records inside the window, in their original order.
    pub fn select(&self, records: &[ForecastRecord]) -> Vec<ForecastRecord> {
        let selected: Vec<ForecastRecord> = records
            .iter()
            .filter(|r| self.contains(r.timestamp))
            .copied()
            .collect();
        debug!(
            start = %self.start,
            end = %self.end,
            selected = selected.len(),
            total = records.len(),
            "windowed forecast"
        );
        selected
    }
}
