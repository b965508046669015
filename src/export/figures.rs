//! Plot artifacts as plain data for the host to render.

use chrono::NaiveDate;
use serde::Serialize;

use crate::common::types::{CanonicalSeries, ForecastRecord};
use crate::forecast::FittedModel;
use crate::window::ForecastWindow;

pub const FORECAST_TITLE: &str = "Forecast (Monthly Data)";
pub const DATE_LABEL: &str = "Date";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: NaiveDate,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandPoint {
    pub x: NaiveDate,
    pub lower: f64,
    pub upper: f64,
}

/// Observed points, the forecast line and its uncertainty band, with the
/// visible x-range set to the forecast window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastFigure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (NaiveDate, NaiveDate),
    pub observed: Vec<Point>,
    pub forecast: Vec<Point>,
    pub band: Vec<BandPoint>,
}

impl ForecastFigure {
    pub fn new(
        series: &CanonicalSeries,
        forecast: &[ForecastRecord],
        window: &ForecastWindow,
        target_column: &str,
    ) -> Self {
        ForecastFigure {
            title: FORECAST_TITLE.to_string(),
            x_label: DATE_LABEL.to_string(),
            y_label: target_column.to_string(),
            x_range: (window.start, window.end),
            observed: series
                .points
                .iter()
                .map(|p| Point {
                    x: p.timestamp,
                    y: p.value,
                })
                .collect(),
            forecast: forecast
                .iter()
                .map(|r| Point {
                    x: r.timestamp,
                    y: r.point_forecast,
                })
                .collect(),
            band: forecast
                .iter()
                .map(|r| BandPoint {
                    x: r.timestamp,
                    lower: r.lower_bound,
                    upper: r.upper_bound,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Trend panel with its band, and the yearly seasonal shape over one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentsFigure {
    pub trend: Vec<Point>,
    pub trend_band: Vec<BandPoint>,
    pub yearly_reference_year: i32,
    pub yearly: Vec<Point>,
}

impl ComponentsFigure {
    pub fn new(forecast: &[ForecastRecord], model: &FittedModel, reference_year: i32) -> Self {
        ComponentsFigure {
            trend: forecast
                .iter()
                .map(|r| Point {
                    x: r.timestamp,
                    y: r.trend,
                })
                .collect(),
            trend_band: forecast
                .iter()
                .map(|r| BandPoint {
                    x: r.timestamp,
                    lower: r.trend_lower,
                    upper: r.trend_upper,
                })
                .collect(),
            yearly_reference_year: reference_year,
            yearly: model
                .yearly_profile(reference_year)
                .into_iter()
                .map(|(x, y)| Point { x, y })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::SeriesPoint;
    use crate::forecast::params::ModelConfig;
    use crate::forecast::{Cadence, ForecastEngine};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series() -> CanonicalSeries {
        CanonicalSeries {
            points: (1..=12)
                .map(|m| SeriesPoint {
                    timestamp: date(2023, m, 1),
                    value: 50.0 + m as f64,
                })
                .collect(),
        }
    }

    #[test]
    fn test_forecast_figure_labels_and_range() {
        let series = series();
        let engine = ForecastEngine::new(ModelConfig {
            uncertainty_samples: 100,
            ..ModelConfig::default()
        })
        .unwrap();
        let model = engine.fit(&series).unwrap();
        let forecast = engine.forecast(&model, 3, Cadence::MonthStart).unwrap();
        let window = ForecastWindow::for_series(&series, 5, 3).unwrap();

        let figure = ForecastFigure::new(&series, &forecast, &window, "Calls");
        assert_eq!(figure.title, "Forecast (Monthly Data)");
        assert_eq!(figure.x_label, "Date");
        assert_eq!(figure.y_label, "Calls");
        assert_eq!(figure.x_range, (date(2023, 7, 1), date(2024, 3, 1)));
        assert_eq!(figure.observed.len(), 12);
        assert_eq!(figure.forecast.len(), 15);
        assert_eq!(figure.band.len(), 15);

        let json = figure.to_json().unwrap();
        assert!(json.contains("\"title\":\"Forecast (Monthly Data)\""));
        assert!(json.contains("2023-07-01"));
    }

    #[test]
    fn test_components_figure() {
        let series = series();
        let engine = ForecastEngine::new(ModelConfig {
            uncertainty_samples: 100,
            ..ModelConfig::default()
        })
        .unwrap();
        let model = engine.fit(&series).unwrap();
        let forecast = engine.forecast(&model, 3, Cadence::MonthStart).unwrap();

        let figure = ComponentsFigure::new(&forecast, &model, 2023);
        assert_eq!(figure.trend.len(), 15);
        assert_eq!(figure.trend_band.len(), 15);
        assert_eq!(figure.yearly.len(), 365);
        assert_eq!(figure.yearly[0].x, date(2023, 1, 1));
        assert!(figure.to_json().is_ok());
    }
}
