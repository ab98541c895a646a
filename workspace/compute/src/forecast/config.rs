use serde::{Deserialize, Serialize};

use crate::error::{ComputeError, Result};

/// Whether a seasonal component takes part in the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityToggle {
    /// Enabled when the history is long and dense enough to estimate it
    #[default]
    Auto,
    Enabled,
    Disabled,
}

/// Tuning knobs of the forecaster.
///
/// Defaults reproduce the usual settings of additive trend + seasonality
/// forecasting libraries, so an untouched config gives familiar results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of potential trend changepoints
    pub n_changepoints: usize,
    /// Share of the history in which changepoints are placed
    pub changepoint_range: f64,
    /// Prior scale of the trend rate adjustments; larger means a more flexible trend
    pub changepoint_prior_scale: f64,
    /// Prior scale of the Fourier coefficients
    pub seasonality_prior_scale: f64,
    pub yearly: SeasonalityToggle,
    pub weekly: SeasonalityToggle,
    /// Coverage of the uncertainty interval, in (0, 1)
    pub interval_width: f64,
    /// Simulated paths used for the interval; 0 disables interval estimation
    pub uncertainty_samples: usize,
    /// Seed of the interval simulation
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly: SeasonalityToggle::Auto,
            weekly: SeasonalityToggle::Auto,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 0,
        }
    }
}

impl ForecastConfig {
    pub fn with_interval_width(mut self, interval_width: f64) -> Self {
        self.interval_width = interval_width;
        self
    }

    pub fn with_uncertainty_samples(mut self, samples: usize) -> Self {
        self.uncertainty_samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ComputeError::InvalidConfig(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_prior_scale > 0.0) || !(self.seasonality_prior_scale > 0.0) {
            return Err(ComputeError::InvalidConfig(
                "prior scales must be positive".to_string(),
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ComputeError::InvalidConfig(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}
