use linregress::{FormulaRegressionBuilder, RegressionDataBuilder};
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};
use rand_xoshiro::Xoshiro256PlusPlus;
use statrs::statistics::Statistics;
use tracing::debug;

use crate::forecast::params::ModelConfig;
use crate::seasonality::fourier_features_at;
use crate::seasonality::params::SeasonalityParams;

/// Standard deviation of the Gaussian prior on trend offset and slope.
const TREND_PRIOR_SCALE: f64 = 5.0;

/// Noise variance (scaled units) used when no OLS estimate is available.
const DEFAULT_NOISE_VARIANCE: f64 = 0.01;

/// Lower bound on the noise variance (scaled units).
const MIN_NOISE_VARIANCE: f64 = 1e-6;

/// Smallest |delta| used when reweighting the Laplace prior.
const DELTA_FLOOR: f64 = 1e-6;

const MAX_MAP_ITERATIONS: usize = 100;
const MAP_TOLERANCE: f64 = 1e-9;

/// Maps dates and values onto the unit scales the model is fitted on.
///
/// `t = (days - start_days) / span_days` puts the history on [0, 1];
/// values are divided by `y_scale = max |y|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub start_days: f64,
    pub span_days: f64,
    pub y_scale: f64,
}

impl Scaling {
    pub fn t(&self, days: f64) -> f64 {
        (days - self.start_days) / self.span_days
    }
}

/// Fitted coefficients of the additive model, in scaled units.
///
/// `y(t) = offset + slope·t + Σ δ_j·max(0, t − s_j) + Σ_c β_c·F_c(t) + ε`
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveFit {
    pub offset: f64,
    pub slope: f64,
    /// Changepoint locations on the scaled time axis.
    pub changepoints_t: Vec<f64>,
    /// Slope adjustment at each changepoint.
    pub deltas: Vec<f64>,
    /// Each seasonal component with its fitted Fourier coefficients.
    pub seasonal: Vec<(SeasonalityParams, Vec<f64>)>,
    /// Observation noise standard deviation.
    pub sigma_obs: f64,
    pub iterations: usize,
}

impl AdditiveFit {
    /// Piecewise-linear trend at scaled time `t`.
    pub fn trend(&self, t: f64) -> f64 {
        self.offset
            + self.slope * t
            + self
                .changepoints_t
                .iter()
                .zip(self.deltas.iter())
                .map(|(s, d)| d * (t - s).max(0.0))
                .sum::<f64>()
    }

    /// Value of one seasonal component at `days` since the epoch.
    pub fn seasonal_component(&self, index: usize, days: f64) -> f64 {
        self.seasonal
            .get(index)
            .map(|(params, beta)| {
                fourier_features_at(days, params)
                    .iter()
                    .zip(beta.iter())
                    .map(|(f, b)| f * b)
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Sum of all seasonal components at `days` since the epoch.
    pub fn seasonal_total(&self, days: f64) -> f64 {
        (0..self.seasonal.len())
            .map(|i| self.seasonal_component(i, days))
            .sum()
    }
}

/// Indexes of the history points used as changepoints.
///
/// Candidates come from the first `range` fraction of the history, spread
/// evenly; the first point is never a changepoint. The count is reduced when
/// the history is too short to hold `requested` of them.
pub fn changepoint_indexes(n: usize, requested: usize, range: f64) -> Vec<usize> {
    let hist_size = (n as f64 * range).floor() as usize;
    let count = requested.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }
    if count < requested {
        debug!(
            requested,
            used = count,
            "reduced number of changepoints to fit the history"
        );
    }

    let last = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| (last * i as f64 / count as f64).round() as usize)
        .collect()
}

/// Cap a component's Fourier order at what the observation spacing can
/// resolve: terms above the Nyquist limit alias onto lower ones.
pub fn resolvable_order(params: &SeasonalityParams, spacing_days: f64) -> usize {
    let nyquist = (params.period / (2.0 * spacing_days.max(1.0))).floor() as usize;
    params.fourier_order.min(nyquist.max(1))
}

/// Fit the additive model by maximum a posteriori estimation.
///
/// Priors: N(0, 5²) on offset and slope, N(0, scale²) on Fourier
/// coefficients, Laplace(0, changepoint_prior_scale) on changepoint deltas.
/// The Laplace prior is handled by iteratively reweighted ridge, and the
/// noise variance is re-estimated from the residuals on every pass.
pub fn fit_additive(
    days: &[f64],
    values: &[f64],
    config: &ModelConfig,
    seasonalities: &[SeasonalityParams],
) -> Result<(Scaling, AdditiveFit), String> {
    let n = values.len();
    if n != days.len() {
        return Err(format!(
            "Timestamp and value lengths differ ({} vs {})",
            days.len(),
            n
        ));
    }
    if n == 0 {
        return Err("Cannot fit an empty series".to_string());
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err("Series contains non-finite values".to_string());
    }

    let start_days = days.iter().cloned().fold(f64::INFINITY, f64::min);
    let end_days = days.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span_days = end_days - start_days;
    if span_days <= 0.0 {
        return Err("All timestamps are identical; the series has no time span".to_string());
    }

    let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let y_scale = if max_abs > 0.0 { max_abs } else { 1.0 };
    let scaling = Scaling {
        start_days,
        span_days,
        y_scale,
    };

    let t: Vec<f64> = days.iter().map(|&d| scaling.t(d)).collect();
    let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

    let changepoints_t: Vec<f64> =
        changepoint_indexes(n, config.n_changepoints, config.changepoint_range)
            .into_iter()
            .map(|i| t[i])
            .collect();
    let n_cp = changepoints_t.len();
    let seasonal_width: usize = seasonalities.iter().map(|s| s.width()).sum();
    let p = 2 + n_cp + seasonal_width;

    // Design matrix: [1, t, (t - s_j)+ ..., fourier features ...]
    let mut flat = Vec::with_capacity(n * p);
    for (i, &ti) in t.iter().enumerate() {
        flat.push(1.0);
        flat.push(ti);
        flat.extend(changepoints_t.iter().map(|s| (ti - s).max(0.0)));
        for params in seasonalities {
            flat.extend(fourier_features_at(days[i], params));
        }
    }
    let x = DMatrix::from_row_slice(n, p, &flat);
    let y_vec = DVector::from_vec(y.clone());

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y_vec;

    // Fixed prior precisions; the changepoint block is reweighted per pass
    let mut precision = vec![0.0; p];
    precision[0] = 1.0 / TREND_PRIOR_SCALE.powi(2);
    precision[1] = 1.0 / TREND_PRIOR_SCALE.powi(2);
    let mut col = 2 + n_cp;
    for params in seasonalities {
        for _ in 0..params.width() {
            precision[col] = 1.0 / params.prior_scale.powi(2);
            col += 1;
        }
    }

    let laplace_scale = config.changepoint_prior_scale;
    let mut deltas_prev = vec![laplace_scale; n_cp];
    let mut sigma2 = initial_noise_variance(&t, &y);
    let mut theta = DVector::<f64>::zeros(p);
    let mut iterations = 0;

    for iter in 0..MAX_MAP_ITERATIONS {
        iterations = iter + 1;
        for (j, d) in deltas_prev.iter().enumerate() {
            precision[2 + j] = 1.0 / (laplace_scale * d.abs().max(DELTA_FLOOR));
        }

        let mut a = xtx.clone();
        for (j, prec) in precision.iter().enumerate() {
            a[(j, j)] += sigma2 * prec;
        }

        let (next, a_inv) = solve_symmetric(a, &xty)?;

        let residuals = &y_vec - &x * &next;
        let rss = residuals.norm_squared();
        // Effective degrees of freedom of the penalised fit: tr(A⁻¹ XᵀX)
        let df_eff = a_inv.component_mul(&xtx).sum();
        let next_sigma2 = (rss / (n as f64 - df_eff).max(1.0)).max(MIN_NOISE_VARIANCE);

        let change = (&next - &theta).amax();
        theta = next;
        let sigma_change = (next_sigma2 - sigma2).abs();
        sigma2 = next_sigma2;
        deltas_prev = (0..n_cp).map(|j| theta[2 + j]).collect();

        if iter > 0 && change < MAP_TOLERANCE && sigma_change < MAP_TOLERANCE {
            break;
        }
    }

    if theta.iter().any(|v| !v.is_finite()) {
        return Err("Fitted coefficients are not finite".to_string());
    }

    let mut seasonal = Vec::with_capacity(seasonalities.len());
    let mut col = 2 + n_cp;
    for params in seasonalities {
        let beta: Vec<f64> = (col..col + params.width()).map(|j| theta[j]).collect();
        col += params.width();
        seasonal.push((*params, beta));
    }

    let fit = AdditiveFit {
        offset: theta[0],
        slope: theta[1],
        changepoints_t,
        deltas: deltas_prev,
        seasonal,
        sigma_obs: sigma2.sqrt(),
        iterations,
    };

    debug!(
        iterations,
        offset = fit.offset,
        slope = fit.slope,
        sigma_obs = fit.sigma_obs,
        changepoints = n_cp,
        "MAP fit converged"
    );

    Ok((scaling, fit))
}

/// Solve `A θ = b` for a symmetric positive-definite `A`, also returning
/// `A⁻¹`. Falls back to LU when Cholesky fails numerically.
fn solve_symmetric(
    a: DMatrix<f64>,
    b: &DVector<f64>,
) -> Result<(DVector<f64>, DMatrix<f64>), String> {
    if let Some(chol) = a.clone().cholesky() {
        let theta = chol.solve(b);
        let inverse = chol.inverse();
        return Ok((theta, inverse));
    }

    debug!("Cholesky factorisation failed, falling back to LU");
    let inverse = a
        .clone()
        .try_inverse()
        .ok_or_else(|| "Normal equations are singular".to_string())?;
    let theta = a
        .lu()
        .solve(b)
        .ok_or_else(|| "Normal equations are singular".to_string())?;
    Ok((theta, inverse))
}

/// Starting noise variance: residual variance of an OLS line through the
/// scaled data.
fn initial_noise_variance(t: &[f64], y: &[f64]) -> f64 {
    if t.len() < 3 {
        return DEFAULT_NOISE_VARIANCE;
    }

    let data = vec![("Y".to_string(), y.to_vec()), ("X".to_string(), t.to_vec())];
    let fitted = RegressionDataBuilder::new()
        .build_from(data)
        .and_then(|regression_data| {
            FormulaRegressionBuilder::new()
                .data(&regression_data)
                .formula("Y ~ X")
                .fit()
        });

    match fitted {
        Ok(model) if model.scale().is_finite() => model.scale().max(MIN_NOISE_VARIANCE),
        Ok(_) => DEFAULT_NOISE_VARIANCE,
        Err(e) => {
            debug!(error = %e, "OLS seed for noise variance failed, using default");
            DEFAULT_NOISE_VARIANCE
        }
    }
}

/// Uncertainty bands from simulated paths, in scaled units.
#[derive(Debug, Clone, PartialEq)]
pub struct Intervals {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub trend_lower: Vec<f64>,
    pub trend_upper: Vec<f64>,
}

/// Simulate `samples` paths and take the central `width` interval.
///
/// Past the end of the history (`t > 1`) each path draws new changepoints as
/// a Poisson process with the historical rate, with Laplace-distributed slope
/// changes whose scale is the mean absolute fitted delta. Every point also
/// gets Gaussian observation noise.
pub fn simulate_intervals(
    fit: &AdditiveFit,
    t: &[f64],
    seasonal: &[f64],
    samples: usize,
    width: f64,
    seed: u64,
) -> Result<Intervals, String> {
    let n = t.len();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let base_trend: Vec<f64> = t.iter().map(|&ti| fit.trend(ti)).collect();
    let t_max = t.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let future_span = (t_max - 1.0).max(0.0);

    let rate = fit.changepoints_t.len().max(1) as f64;
    let mean_abs_delta = if fit.deltas.is_empty() {
        0.0
    } else {
        fit.deltas.iter().map(|d| d.abs()).mean()
    };
    let laplace_scale = mean_abs_delta + 1e-8;

    let noise = Normal::new(0.0, fit.sigma_obs).map_err(|e| format!("Invalid noise scale: {}", e))?;
    let magnitude = Exp::new(1.0 / laplace_scale)
        .map_err(|e| format!("Invalid changepoint scale: {}", e))?;
    let arrivals = if future_span > 0.0 {
        Some(
            Poisson::new(rate * future_span)
                .map_err(|e| format!("Invalid changepoint rate: {}", e))?,
        )
    } else {
        None
    };

    let mut trend_paths = vec![Vec::with_capacity(samples); n];
    let mut yhat_paths = vec![Vec::with_capacity(samples); n];

    for _ in 0..samples {
        let new_changes: Vec<(f64, f64)> = match &arrivals {
            Some(poisson) => {
                let count: f64 = poisson.sample(&mut rng);
                (0..count as usize)
                    .map(|_| {
                        let at = rng.gen_range(1.0..t_max);
                        let size = magnitude.sample(&mut rng);
                        let delta = if rng.gen::<bool>() { size } else { -size };
                        (at, delta)
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        for i in 0..n {
            let extra: f64 = new_changes
                .iter()
                .map(|(at, delta)| delta * (t[i] - at).max(0.0))
                .sum();
            let trend = base_trend[i] + extra;
            trend_paths[i].push(trend);
            yhat_paths[i].push(trend + seasonal[i] + noise.sample(&mut rng));
        }
    }

    let lower_q = (1.0 - width) / 2.0;
    let upper_q = (1.0 + width) / 2.0;

    let mut intervals = Intervals {
        lower: Vec::with_capacity(n),
        upper: Vec::with_capacity(n),
        trend_lower: Vec::with_capacity(n),
        trend_upper: Vec::with_capacity(n),
    };
    for i in 0..n {
        trend_paths[i].sort_by(f64::total_cmp);
        yhat_paths[i].sort_by(f64::total_cmp);
        intervals.lower.push(quantile(&yhat_paths[i], lower_q));
        intervals.upper.push(quantile(&yhat_paths[i], upper_q));
        intervals.trend_lower.push(quantile(&trend_paths[i], lower_q));
        intervals.trend_upper.push(quantile(&trend_paths[i], upper_q));
    }

    Ok(intervals)
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
