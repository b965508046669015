//! Fourier-series seasonal components.
//!
//! A component with period `P` and order `N` is the sum
//! `Σ_{i=1..N} a_i sin(2π i t / P) + b_i cos(2π i t / P)` where `t` is days
//! since 1970-01-01. The forecast model fits the coefficients; this module
//! only builds the basis and evaluates fitted components.

pub mod params;

use chrono::{Duration, NaiveDate};
use std::f64::consts::PI;

use crate::common::calendar::days_since_epoch;
use params::SeasonalityParams;

/// Fourier basis row for one date: `[sin(1·x), cos(1·x), …, sin(N·x), cos(N·x)]`.
pub fn fourier_features(date: NaiveDate, params: &SeasonalityParams) -> Vec<f64> {
    fourier_features_at(days_since_epoch(date), params)
}

/// Same as [`fourier_features`] for a raw day offset.
pub fn fourier_features_at(days: f64, params: &SeasonalityParams) -> Vec<f64> {
    let mut row = Vec::with_capacity(params.width());
    for i in 1..=params.fourier_order {
        let x = 2.0 * PI * i as f64 * days / params.period;
        row.push(x.sin());
        row.push(x.cos());
    }
    row
}

/// Evaluate a fitted component at a date.
pub fn evaluate(date: NaiveDate, params: &SeasonalityParams, coefficients: &[f64]) -> f64 {
    fourier_features(date, params)
        .iter()
        .zip(coefficients)
        .map(|(f, c)| f * c)
        .sum()
}

/// A fitted component sampled daily over one reference year, for the
/// components figure.
pub fn yearly_profile(
    params: &SeasonalityParams,
    coefficients: &[f64],
    reference_year: i32,
) -> Vec<(NaiveDate, f64)> {
    let Some(start) = NaiveDate::from_ymd_opt(reference_year, 1, 1) else {
        return Vec::new();
    };
    let Some(end) = NaiveDate::from_ymd_opt(reference_year + 1, 1, 1) else {
        return Vec::new();
    };
    let days = (end - start).num_days();

    (0..days)
        .map(|d| {
            let date = start + Duration::days(d);
            (date, evaluate(date, params, coefficients))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_width_and_range() {
        let params = SeasonalityParams::yearly(5.0);
        let row = fourier_features(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), &params);
        assert_eq!(row.len(), 20);
        assert!(row.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_features_at_epoch() {
        let params = SeasonalityParams::yearly(5.0);
        let row = fourier_features_at(0.0, &params);
        for pair in row.chunks(2) {
            assert!(pair[0].abs() < 1e-12);
            assert!((pair[1] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_features_repeat_after_one_period() {
        let params = SeasonalityParams::yearly(5.0);
        let a = fourier_features_at(100.0, &params);
        let b = fourier_features_at(100.0 + params.period, &params);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_yearly_profile_covers_year() {
        let params = SeasonalityParams::yearly(5.0);
        let coefficients = vec![0.0; params.width()];
        assert_eq!(yearly_profile(&params, &coefficients, 2024).len(), 366);
        assert_eq!(yearly_profile(&params, &coefficients, 2023).len(), 365);
    }

    #[test]
    fn test_params_validation() {
        assert!(SeasonalityParams::yearly(5.0).validate().is_ok());
        assert!(SeasonalityParams::yearly(0.0).validate().is_err());
        let mut p = SeasonalityParams::yearly(5.0);
        p.fourier_order = 0;
        assert!(p.validate().is_err());
    }
}
