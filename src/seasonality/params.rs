/// Length of the yearly cycle in days.
pub const YEARLY_PERIOD_DAYS: f64 = 365.25;

/// Length of the weekly cycle in days.
pub const WEEKLY_PERIOD_DAYS: f64 = 7.0;

/// Length of the daily cycle in days.
pub const DAILY_PERIOD_DAYS: f64 = 1.0;

/// Default number of Fourier pairs for the yearly component.
pub const DEFAULT_YEARLY_FOURIER_ORDER: usize = 10;

const DEFAULT_WEEKLY_FOURIER_ORDER: usize = 3;
const DEFAULT_DAILY_FOURIER_ORDER: usize = 4;

/// Parameters of one Fourier seasonal component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalityParams {
    pub name: &'static str,
    /// Cycle length in days.
    pub period: f64,
    /// Number of sine/cosine pairs.
    pub fourier_order: usize,
    /// Standard deviation of the Gaussian prior on the coefficients.
    pub prior_scale: f64,
}

impl SeasonalityParams {
    /// The yearly component with the given prior scale.
    pub fn yearly(prior_scale: f64) -> Self {
        SeasonalityParams {
            name: "yearly",
            period: YEARLY_PERIOD_DAYS,
            fourier_order: DEFAULT_YEARLY_FOURIER_ORDER,
            prior_scale,
        }
    }

    pub fn weekly(prior_scale: f64) -> Self {
        SeasonalityParams {
            name: "weekly",
            period: WEEKLY_PERIOD_DAYS,
            fourier_order: DEFAULT_WEEKLY_FOURIER_ORDER,
            prior_scale,
        }
    }

    pub fn daily(prior_scale: f64) -> Self {
        SeasonalityParams {
            name: "daily",
            period: DAILY_PERIOD_DAYS,
            fourier_order: DEFAULT_DAILY_FOURIER_ORDER,
            prior_scale,
        }
    }

    /// Number of regression columns this component contributes.
    pub fn width(&self) -> usize {
        2 * self.fourier_order
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.period.is_finite() && self.period > 0.0) {
            return Err(format!("{} period must be positive, got {}", self.name, self.period));
        }
        if self.fourier_order == 0 {
            return Err(format!("{} fourier_order must be at least 1", self.name));
        }
        if !(self.prior_scale.is_finite() && self.prior_scale > 0.0) {
            return Err(format!(
                "{} prior_scale must be positive, got {}",
                self.name, self.prior_scale
            ));
        }
        Ok(())
    }
}
