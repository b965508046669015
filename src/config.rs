use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::forecast::params::ModelConfig;

/// Number of month-start periods forecast past the last observation.
pub const DEFAULT_PERIODS_AHEAD: usize = 3;
/// Calendar months shown before the last observation.
pub const DEFAULT_MONTHS_BACK: u32 = 5;
/// Calendar months shown after the last observation.
pub const DEFAULT_MONTHS_FORWARD: u32 = 3;
/// Rows shown in the table previews.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Run-shape settings for one pipeline invocation.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub periods_ahead: usize,
    pub months_back: u32,
    pub months_forward: u32,
    pub preview_rows: usize,
    pub uncertainty_samples: usize,
    pub interval_width: f64,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let model = ModelConfig::default();
        PipelineConfig {
            periods_ahead: DEFAULT_PERIODS_AHEAD,
            months_back: DEFAULT_MONTHS_BACK,
            months_forward: DEFAULT_MONTHS_FORWARD,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            uncertainty_samples: model.uncertainty_samples,
            interval_width: model.interval_width,
            seed: model.seed,
        }
    }
}

impl PipelineConfig {
    /// Parse a config from JSON, then validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig =
            serde_json::from_str(json).map_err(|e| PipelineError::Config {
                name: "json".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.preview_rows == 0 {
            return Err(config_error("preview_rows", "must be a positive integer"));
        }
        if self.months_back == 0 && self.months_forward == 0 {
            return Err(config_error(
                "months_back",
                "window must extend at least one month in some direction",
            ));
        }
        self.model_config().validate().map_err(|reason| {
            let name = if reason.starts_with("interval_width") {
                "interval_width"
            } else if reason.starts_with("uncertainty_samples") {
                "uncertainty_samples"
            } else {
                "model"
            };
            config_error(name, &reason)
        })
    }

    /// The fixed model configuration with this run's sampling settings.
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            uncertainty_samples: self.uncertainty_samples,
            interval_width: self.interval_width,
            seed: self.seed,
            ..ModelConfig::default()
        }
    }
}

fn config_error(name: &str, reason: &str) -> PipelineError {
    PipelineError::Config {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.periods_ahead, 3);
        assert_eq!(config.months_back, 5);
        assert_eq!(config.months_forward, 3);
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.uncertainty_samples, 1000);
        assert_eq!(config.interval_width, 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = PipelineConfig::from_json(r#"{"seed": 42, "periods_ahead": 6}"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.periods_ahead, 6);
        assert_eq!(config.months_back, 5);
        assert_eq!(config.model_config().seed, 42);
    }

    #[test]
    fn test_from_json_empty_object() {
        assert_eq!(PipelineConfig::from_json("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        let err = PipelineConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_invalid_values() {
        let err = PipelineConfig {
            interval_width: 1.5,
            ..PipelineConfig::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config { ref name, .. } if name == "interval_width"));

        let err = PipelineConfig {
            uncertainty_samples: 0,
            ..PipelineConfig::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Config { ref name, .. } if name == "uncertainty_samples"
        ));

        let err = PipelineConfig {
            preview_rows: 0,
            ..PipelineConfig::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config { ref name, .. } if name == "preview_rows"));
    }
}
