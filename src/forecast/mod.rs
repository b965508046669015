pub mod models;
pub mod params;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::common::calendar::{
    date_from_epoch_days, days_since_epoch, detect_spacing_days, month_starts_after,
};
use crate::common::types::{CanonicalSeries, ForecastRecord, MIN_DATA_POINTS};
use crate::error::{PipelineError, Result};
use crate::seasonality;
use crate::seasonality::params::SeasonalityParams;
use models::{AdditiveFit, Scaling};
use params::ModelConfig;

/// Spacing of the future periods appended after the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// First day of each calendar month.
    MonthStart,
}

impl Cadence {
    /// The first `periods` dates of this cadence strictly after `last`.
    pub fn dates_after(&self, last: NaiveDate, periods: usize) -> Option<Vec<NaiveDate>> {
        match self {
            Cadence::MonthStart => month_starts_after(last, periods),
        }
    }
}

/// Fits the additive trend + yearly seasonality model and produces forecasts.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ModelConfig,
}

impl ForecastEngine {
    /// Build an engine, validating the model hyper-parameters.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate().map_err(|reason| PipelineError::Config {
            name: "model".to_string(),
            reason,
        })?;
        Ok(ForecastEngine { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit the model to a canonical series.
    pub fn fit(&self, series: &CanonicalSeries) -> Result<FittedModel> {
        if series.len() < MIN_DATA_POINTS {
            return Err(PipelineError::InsufficientData {
                required: MIN_DATA_POINTS,
                actual: series.len(),
            });
        }

        let history = series.timestamps();
        let values = series.values();
        let days: Vec<f64> = history.iter().map(|d| days_since_epoch(*d)).collect();

        let spacing = detect_spacing_days(&history);
        let seasonalities: Vec<SeasonalityParams> = self
            .config
            .seasonalities()
            .into_iter()
            .map(|mut s| {
                let order = models::resolvable_order(&s, spacing as f64);
                if order < s.fourier_order {
                    debug!(
                        seasonality = s.name,
                        requested = s.fourier_order,
                        used = order,
                        spacing_days = spacing,
                        "capped Fourier order at the observation spacing"
                    );
                }
                s.fourier_order = order;
                s
            })
            .collect();

        let (scaling, fit) = models::fit_additive(&days, &values, &self.config, &seasonalities)
            .map_err(PipelineError::Fit)?;

        info!(
            growth = %self.config.growth,
            seasonality_mode = %self.config.seasonality_mode,
            observations = series.len(),
            changepoints = fit.changepoints_t.len(),
            iterations = fit.iterations,
            "model fitted"
        );

        Ok(FittedModel {
            config: self.config.clone(),
            scaling,
            fit,
            history,
        })
    }

    /// Forecast over the whole history plus `periods_ahead` future dates.
    ///
    /// Historical timestamps are kept exactly as observed (duplicates
    /// included), so the output has `series.len() + periods_ahead` records.
    pub fn forecast(
        &self,
        model: &FittedModel,
        periods_ahead: usize,
        cadence: Cadence,
    ) -> Result<Vec<ForecastRecord>> {
        let last = model.last_timestamp().ok_or(PipelineError::InsufficientData {
            required: MIN_DATA_POINTS,
            actual: 0,
        })?;
        let future = cadence.dates_after(last, periods_ahead).ok_or_else(|| {
            PipelineError::Fit("forecast horizon leaves the supported date range".to_string())
        })?;

        let mut dates = model.history.clone();
        dates.extend(future);
        let records = model.predict(&dates)?;

        debug!(
            periods_ahead,
            total = records.len(),
            "forecast produced"
        );
        Ok(records)
    }
}

/// A model fitted to one series.
#[derive(Debug, Clone)]
pub struct FittedModel {
    config: ModelConfig,
    scaling: Scaling,
    fit: AdditiveFit,
    history: Vec<NaiveDate>,
}

impl FittedModel {
    /// Timestamps the model was fitted on, ascending.
    pub fn history(&self) -> &[NaiveDate] {
        &self.history
    }

    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.history.last().copied()
    }

    /// Observation noise standard deviation in the units of the data.
    pub fn noise_std(&self) -> f64 {
        self.fit.sigma_obs * self.scaling.y_scale
    }

    /// Dates at which the trend is allowed to change slope.
    pub fn changepoint_dates(&self) -> Vec<NaiveDate> {
        self.fit
            .changepoints_t
            .iter()
            .filter_map(|t| {
                date_from_epoch_days(self.scaling.start_days + t * self.scaling.span_days)
            })
            .collect()
    }

    /// Predict at arbitrary dates, with uncertainty intervals.
    pub fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastRecord>> {
        let days: Vec<f64> = dates.iter().map(|d| days_since_epoch(*d)).collect();
        let t: Vec<f64> = days.iter().map(|d| self.scaling.t(*d)).collect();
        let seasonal: Vec<f64> = days.iter().map(|d| self.fit.seasonal_total(*d)).collect();
        let yearly_index = self
            .fit
            .seasonal
            .iter()
            .position(|(params, _)| params.name == "yearly");

        let intervals = models::simulate_intervals(
            &self.fit,
            &t,
            &seasonal,
            self.config.uncertainty_samples,
            self.config.interval_width,
            self.config.seed,
        )
        .map_err(PipelineError::Fit)?;

        let scale = self.scaling.y_scale;
        let records = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let trend = self.fit.trend(t[i]);
                let yearly = yearly_index
                    .map(|idx| self.fit.seasonal_component(idx, days[i]))
                    .unwrap_or(0.0);
                ForecastRecord {
                    timestamp: *date,
                    point_forecast: (trend + seasonal[i]) * scale,
                    lower_bound: intervals.lower[i] * scale,
                    upper_bound: intervals.upper[i] * scale,
                    trend: trend * scale,
                    trend_lower: intervals.trend_lower[i] * scale,
                    trend_upper: intervals.trend_upper[i] * scale,
                    yearly: yearly * scale,
                }
            })
            .collect();
        Ok(records)
    }

    /// The fitted yearly component sampled daily over `reference_year`,
    /// in the units of the data. Empty when yearly seasonality is off.
    pub fn yearly_profile(&self, reference_year: i32) -> Vec<(NaiveDate, f64)> {
        self.fit
            .seasonal
            .iter()
            .find(|(params, _)| params.name == "yearly")
            .map(|(params, beta)| {
                seasonality::yearly_profile(params, beta, reference_year)
                    .into_iter()
                    .map(|(date, v)| (date, v * self.scaling.y_scale))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::SeriesPoint;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two years of month-start data with a trend and a summer peak.
    fn monthly_series(months: u32) -> CanonicalSeries {
        let points = (0..months)
            .map(|i| {
                let timestamp = date(2022 + (i / 12) as i32, i % 12 + 1, 1);
                let season = if (6..=8).contains(&(i % 12 + 1)) { 20.0 } else { 0.0 };
                SeriesPoint {
                    timestamp,
                    value: 100.0 + 2.0 * i as f64 + season,
                }
            })
            .collect();
        CanonicalSeries { points }
    }

    fn fast_engine() -> ForecastEngine {
        ForecastEngine::new(ModelConfig {
            uncertainty_samples: 200,
            ..ModelConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_forecast_length_and_cadence() {
        let series = monthly_series(24);
        let engine = fast_engine();
        let model = engine.fit(&series).unwrap();
        let records = engine.forecast(&model, 3, Cadence::MonthStart).unwrap();

        assert_eq!(records.len(), 27);
        for (record, point) in records.iter().zip(series.points.iter()) {
            assert_eq!(record.timestamp, point.timestamp);
        }
        let future: Vec<NaiveDate> = records[24..].iter().map(|r| r.timestamp).collect();
        assert_eq!(future, vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]);
    }

    #[test]
    fn test_forecast_after_mid_month_history() {
        let points = (1..=12)
            .map(|m| SeriesPoint {
                timestamp: date(2023, m, 15),
                value: 10.0 + m as f64,
            })
            .collect();
        let series = CanonicalSeries { points };
        let engine = fast_engine();
        let model = engine.fit(&series).unwrap();
        let records = engine.forecast(&model, 2, Cadence::MonthStart).unwrap();
        assert_eq!(records.len(), 14);
        assert_eq!(records[12].timestamp, date(2024, 1, 1));
        assert_eq!(records[13].timestamp, date(2024, 2, 1));
        assert!(records[12..].iter().all(|r| r.timestamp.day() == 1));
    }

    #[test]
    fn test_bounds_bracket_point_forecast() {
        let series = monthly_series(24);
        let engine = fast_engine();
        let model = engine.fit(&series).unwrap();
        let records = engine.forecast(&model, 3, Cadence::MonthStart).unwrap();
        for r in &records {
            assert!(r.point_forecast.is_finite());
            assert!(r.lower_bound <= r.point_forecast, "{:?}", r);
            assert!(r.upper_bound >= r.point_forecast, "{:?}", r);
            assert!(r.trend_lower <= r.trend_upper);
            assert!((r.point_forecast - (r.trend + r.yearly)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_in_sample_fit_tracks_data() {
        let series = monthly_series(24);
        let engine = fast_engine();
        let model = engine.fit(&series).unwrap();
        let records = engine.forecast(&model, 0, Cadence::MonthStart).unwrap();
        assert_eq!(records.len(), 24);
        let mae: f64 = records
            .iter()
            .zip(series.points.iter())
            .map(|(r, p)| (r.point_forecast - p.value).abs())
            .sum::<f64>()
            / 24.0;
        assert!(mae < 10.0, "mean absolute error {}", mae);
    }

    #[test]
    fn test_same_seed_same_forecast() {
        let series = monthly_series(18);
        let engine = fast_engine();
        let a = engine
            .forecast(&engine.fit(&series).unwrap(), 3, Cadence::MonthStart)
            .unwrap();
        let b = engine
            .forecast(&engine.fit(&series).unwrap(), 3, Cadence::MonthStart)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_timestamps_pass_through() {
        let mut series = monthly_series(12);
        series.points.insert(
            3,
            SeriesPoint {
                timestamp: series.points[3].timestamp,
                value: 150.0,
            },
        );
        let engine = fast_engine();
        let model = engine.fit(&series).unwrap();
        let records = engine.forecast(&model, 3, Cadence::MonthStart).unwrap();
        assert_eq!(records.len(), 16);
        assert_eq!(records[3].timestamp, records[4].timestamp);
    }

    #[test]
    fn test_insufficient_data() {
        let engine = fast_engine();
        let empty = CanonicalSeries { points: vec![] };
        assert_eq!(
            engine.fit(&empty).unwrap_err(),
            PipelineError::InsufficientData {
                required: 2,
                actual: 0
            }
        );

        let one = monthly_series(1);
        assert!(matches!(
            engine.fit(&one),
            Err(PipelineError::InsufficientData { actual: 1, .. })
        ));
    }

    #[test]
    fn test_zero_time_span_is_fit_error() {
        let points = vec![
            SeriesPoint {
                timestamp: date(2024, 1, 1),
                value: 1.0,
            },
            SeriesPoint {
                timestamp: date(2024, 1, 1),
                value: 2.0,
            },
        ];
        let err = fast_engine()
            .fit(&CanonicalSeries { points })
            .unwrap_err();
        assert_eq!(err.kind(), "FitError");
    }

    #[test]
    fn test_invalid_model_config() {
        let err = ForecastEngine::new(ModelConfig {
            interval_width: 0.0,
            ..ModelConfig::default()
        })
        .unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_changepoints_and_yearly_profile() {
        let series = monthly_series(24);
        let model = fast_engine().fit(&series).unwrap();

        assert_eq!(model.history(), series.timestamps().as_slice());
        let changepoints = model.changepoint_dates();
        assert_eq!(changepoints.len(), 10);
        assert!(changepoints.windows(2).all(|w| w[0] <= w[1]));
        assert!(changepoints[0] > date(2022, 1, 1));
        assert!(*changepoints.last().unwrap() < date(2023, 9, 1));

        let profile = model.yearly_profile(2023);
        assert_eq!(profile.len(), 365);
        assert_eq!(profile[0].0, date(2023, 1, 1));
        // Summer months sit above winter months
        let july = profile[196].1;
        let january = profile[15].1;
        assert!(july > january, "july {} january {}", july, january);
        assert!(model.noise_std() > 0.0);
    }
}
