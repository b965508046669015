use serde::{Deserialize, Serialize};
use std::fmt;

use crate::seasonality::params::SeasonalityParams;

/// Trend shape. Only piecewise-linear growth is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Growth {
    Linear,
}

/// How seasonal components combine with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    Additive,
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "linear")
    }
}

impl fmt::Display for SeasonalityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "additive")
    }
}

/// Hyper-parameters of the additive trend + seasonality model.
///
/// The defaults are tuned for monthly business data and are what the
/// pipeline always uses; the struct exists so the values live in one place
/// and are validated once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub growth: Growth,
    pub seasonality_mode: SeasonalityMode,
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    /// Number of potential trend changepoints.
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Scale of the Laplace prior on changepoint slope adjustments.
    pub changepoint_prior_scale: f64,
    /// Standard deviation of the Gaussian prior on seasonal coefficients.
    pub seasonality_prior_scale: f64,
    /// Width of the uncertainty interval (0.8 = 10th to 90th percentile).
    pub interval_width: f64,
    /// Number of simulated paths used for the uncertainty interval.
    pub uncertainty_samples: usize,
    /// Seed for the interval simulation, so runs are reproducible.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            growth: Growth::Linear,
            seasonality_mode: SeasonalityMode::Additive,
            yearly_seasonality: true,
            weekly_seasonality: false,
            daily_seasonality: false,
            n_changepoints: 10,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 5.0,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 0,
        }
    }
}

impl ModelConfig {
    /// Enabled seasonal components, in design-matrix order.
    pub fn seasonalities(&self) -> Vec<SeasonalityParams> {
        let scale = self.seasonality_prior_scale;
        let mut out = Vec::new();
        if self.yearly_seasonality {
            out.push(SeasonalityParams::yearly(scale));
        }
        if self.weekly_seasonality {
            out.push(SeasonalityParams::weekly(scale));
        }
        if self.daily_seasonality {
            out.push(SeasonalityParams::daily(scale));
        }
        out
    }

    /// Validate the hyper-parameters.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            ));
        }
        if !(self.changepoint_prior_scale.is_finite() && self.changepoint_prior_scale > 0.0) {
            return Err(format!(
                "changepoint_prior_scale must be positive, got {}",
                self.changepoint_prior_scale
            ));
        }
        if self.interval_width <= 0.0 || self.interval_width >= 1.0 {
            return Err("interval_width must be between 0.0 and 1.0 (exclusive)".to_string());
        }
        if self.uncertainty_samples == 0 {
            return Err("uncertainty_samples must be a positive integer".to_string());
        }
        for seasonality in self.seasonalities() {
            seasonality.validate()?;
        }
        Ok(())
    }
}
