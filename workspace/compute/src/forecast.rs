//! Additive trend + seasonality forecaster.
//!
//! `y(t) = trend(t) + Σ seasonality(t) + ε`, with a piecewise linear trend and
//! Fourier seasonal terms. Parameters are the maximum a-posteriori estimate
//! under Gaussian priors, which reduces to a ridge regression with one
//! penalty per column.

pub mod config;
pub mod seasonality;
pub mod solver;
pub mod trend;
pub mod uncertainty;

use chrono::{Duration, NaiveDate};
use common::SeasonalityProfile;
use polars::prelude::*;
use tracing::{debug, info, instrument, trace};

use crate::error::{ComputeError, Result};
use crate::frame::{DATE_COLUMN, VALUE_COLUMN, epoch_days, read_dates, read_values};

pub use config::{ForecastConfig, SeasonalityToggle};
use seasonality::{Seasonality, active_seasonalities};
use solver::ridge_solve;
use trend::{PiecewiseLinear, changepoint_positions};
use uncertainty::{SimulationInput, simulate_intervals};

/// Fewest usable observations a fit accepts.
pub const MIN_TRAINING_ROWS: usize = 2;

const OFFSET_PRIOR_SCALE: f64 = 5.0;
const RATE_PRIOR_SCALE: f64 = 5.0;
const INITIAL_SIGMA: f64 = 0.05;
const MIN_SIGMA: f64 = 1e-4;
const SIGMA_ITERATIONS: usize = 3;

/// Output column names of [`FittedForecaster::predict`].
pub mod columns {
    pub const TREND: &str = "trend";
    pub const TREND_LOWER: &str = "trend_lower";
    pub const TREND_UPPER: &str = "trend_upper";
    pub const ADDITIVE_TERMS: &str = "additive_terms";
    pub const YHAT: &str = "yhat";
    pub const YHAT_LOWER: &str = "yhat_lower";
    pub const YHAT_UPPER: &str = "yhat_upper";
}

/// An unfitted forecaster.
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    config: ForecastConfig,
}

/// A forecaster with estimated parameters, ready to predict.
#[derive(Debug, Clone)]
pub struct FittedForecaster {
    config: ForecastConfig,
    start_day: i64,
    span_days: f64,
    y_scale: f64,
    trend: PiecewiseLinear,
    seasonalities: Vec<(Seasonality, Vec<f64>)>,
    sigma: f64,
    history_dates: Vec<NaiveDate>,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Fits the model on a `(ds, y)` table.
    ///
    /// Rows with a null date or a null/NaN value are ignored. The remaining
    /// rows are sorted by date; fewer than [`MIN_TRAINING_ROWS`] of them, or a
    /// history spanning a single day, is an error.
    #[instrument(skip(self, df), fields(rows = df.height()))]
    pub fn fit(&self, df: &DataFrame) -> Result<FittedForecaster> {
        self.config.validate()?;

        let dates = read_dates(df, DATE_COLUMN)?;
        let values = read_values(df, VALUE_COLUMN)?;
        let mut observations: Vec<(NaiveDate, f64)> = dates
            .into_iter()
            .zip(values)
            .filter_map(|(date, value)| match (date, value) {
                (Some(date), Some(value)) if value.is_finite() => Some((date, value)),
                _ => None,
            })
            .collect();
        observations.sort_by_key(|(date, _)| *date);

        if observations.len() < MIN_TRAINING_ROWS {
            return Err(ComputeError::InsufficientData {
                required: MIN_TRAINING_ROWS,
                actual: observations.len(),
            });
        }

        let (history_dates, y): (Vec<NaiveDate>, Vec<f64>) = observations.into_iter().unzip();
        let start_day = epoch_days(history_dates[0]);
        let span_days = (epoch_days(history_dates[history_dates.len() - 1]) - start_day) as f64;
        if span_days <= 0.0 {
            return Err(ComputeError::InsufficientData {
                required: MIN_TRAINING_ROWS,
                actual: 1,
            });
        }

        let y_scale = match y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let y_scaled: Vec<f64> = y.iter().map(|v| v / y_scale).collect();
        let t: Vec<f64> = history_dates
            .iter()
            .map(|d| (epoch_days(*d) - start_day) as f64 / span_days)
            .collect();

        let changepoints = changepoint_positions(
            &t,
            self.config.n_changepoints,
            self.config.changepoint_range,
        );
        let seasonalities =
            active_seasonalities(&history_dates, self.config.yearly, self.config.weekly);
        debug!(
            changepoints = changepoints.len(),
            seasonalities = ?seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            "Fitting forecaster"
        );

        let rows: Vec<Vec<f64>> = history_dates
            .iter()
            .zip(&t)
            .map(|(date, t)| design_row(*date, *t, &changepoints, &seasonalities))
            .collect();

        let mut prior_scales = vec![OFFSET_PRIOR_SCALE, RATE_PRIOR_SCALE];
        prior_scales.extend(std::iter::repeat_n(
            self.config.changepoint_prior_scale,
            changepoints.len(),
        ));
        for seasonality in &seasonalities {
            prior_scales.extend(std::iter::repeat_n(
                self.config.seasonality_prior_scale,
                seasonality.width(),
            ));
        }

        // Noise level and coefficients depend on each other; a few rounds settle both.
        let mut sigma = INITIAL_SIGMA;
        let mut coefficients = Vec::new();
        for round in 0..SIGMA_ITERATIONS {
            let penalties: Vec<f64> = prior_scales
                .iter()
                .map(|scale| (sigma * sigma) / (scale * scale))
                .collect();
            coefficients = ridge_solve(&rows, &y_scaled, &penalties)?;

            let sse: f64 = rows
                .iter()
                .zip(&y_scaled)
                .map(|(row, target)| {
                    let fitted: f64 = row.iter().zip(&coefficients).map(|(x, w)| x * w).sum();
                    (target - fitted).powi(2)
                })
                .sum();
            sigma = (sse / y_scaled.len() as f64).sqrt().max(MIN_SIGMA);
            trace!(round, sigma, "Re-estimated observation noise");
        }

        let mut rest = coefficients.into_iter();
        let m = rest.next().unwrap_or_default();
        let k = rest.next().unwrap_or_default();
        let deltas: Vec<f64> = rest.by_ref().take(changepoints.len()).collect();
        let seasonalities = seasonalities
            .into_iter()
            .map(|s| {
                let coeffs: Vec<f64> = rest.by_ref().take(s.width()).collect();
                (s, coeffs)
            })
            .collect();

        let fitted = FittedForecaster {
            config: self.config.clone(),
            start_day,
            span_days,
            y_scale,
            trend: PiecewiseLinear {
                m,
                k,
                changepoints,
                deltas,
            },
            seasonalities,
            sigma,
            history_dates,
        };
        info!(
            history_rows = fitted.history_rows(),
            sigma = fitted.sigma,
            "Forecaster fitted"
        );

        Ok(fitted)
    }
}

impl FittedForecaster {
    pub fn history_rows(&self) -> usize {
        self.history_dates.len()
    }

    pub fn last_history_date(&self) -> Option<NaiveDate> {
        self.history_dates.last().copied()
    }

    pub fn trend(&self) -> &PiecewiseLinear {
        &self.trend
    }

    /// Observation noise in the units of the training values.
    pub fn noise(&self) -> f64 {
        self.sigma * self.y_scale
    }

    /// Names of the fitted seasonal components, in output column order.
    pub fn seasonality_names(&self) -> Vec<&'static str> {
        self.seasonalities.iter().map(|(s, _)| s.name).collect()
    }

    /// Daily growth of the trend at the end of the history, in value units.
    pub fn final_growth_per_day(&self) -> f64 {
        let rate = self.trend.k + self.trend.deltas.iter().sum::<f64>();
        rate * self.y_scale / self.span_days
    }

    /// The history dates followed by `periods` consecutive days after the last one.
    pub fn make_future_frame(&self, periods: usize, include_history: bool) -> Result<DataFrame> {
        let Some(last) = self.last_history_date() else {
            return Err(ComputeError::ForecastComputation(
                "model has no history".to_string(),
            ));
        };

        let mut dates = if include_history {
            let mut history = self.history_dates.clone();
            history.dedup();
            history
        } else {
            Vec::with_capacity(periods)
        };
        dates.extend((1..=periods as i64).map(|offset| last + Duration::days(offset)));

        crate::frame::date_frame(dates)
    }

    /// Predicts every date of `df`'s `ds` column.
    ///
    /// Returns `ds, trend, trend_lower, trend_upper`, one column per active
    /// seasonality, `additive_terms, yhat_lower, yhat_upper, yhat`.
    #[instrument(skip(self, df), fields(rows = df.height()))]
    pub fn predict(&self, df: &DataFrame) -> Result<DataFrame> {
        let dates = read_dates(df, DATE_COLUMN)?
            .into_iter()
            .collect::<Option<Vec<NaiveDate>>>()
            .ok_or_else(|| {
                ComputeError::ForecastComputation("prediction dates contain nulls".to_string())
            })?;

        let t: Vec<f64> = dates
            .iter()
            .map(|d| (epoch_days(*d) - self.start_day) as f64 / self.span_days)
            .collect();
        let trend: Vec<f64> = t.iter().map(|t| self.trend.value(*t)).collect();
        let components: Vec<Vec<f64>> = self
            .seasonalities
            .iter()
            .map(|(s, coeffs)| dates.iter().map(|d| s.evaluate(*d, coeffs)).collect())
            .collect();
        let seasonal: Vec<f64> = (0..dates.len())
            .map(|i| components.iter().map(|c| c[i]).sum())
            .collect();

        let intervals = simulate_intervals(
            SimulationInput {
                t: &t,
                trend: &trend,
                seasonal: &seasonal,
                sigma: self.sigma,
                n_changepoints: self.trend.changepoints.len(),
                delta_scale: self.trend.mean_abs_delta(),
            },
            self.config.uncertainty_samples,
            self.config.interval_width,
            self.config.seed,
        )?;

        let scale =
            |values: &[f64]| -> Vec<f64> { values.iter().map(|v| v * self.y_scale).collect() };
        let yhat: Vec<f64> = trend.iter().zip(&seasonal).map(|(a, b)| a + b).collect();

        let mut output: Vec<Column> = vec![
            Series::new(DATE_COLUMN.into(), dates).into(),
            Series::new(columns::TREND.into(), scale(&trend)).into(),
            Series::new(columns::TREND_LOWER.into(), scale(&intervals.trend_lower)).into(),
            Series::new(columns::TREND_UPPER.into(), scale(&intervals.trend_upper)).into(),
        ];
        for ((seasonality, _), values) in self.seasonalities.iter().zip(&components) {
            output.push(Series::new(seasonality.name.into(), scale(values)).into());
        }
        output.extend([
            Series::new(columns::ADDITIVE_TERMS.into(), scale(&seasonal)).into(),
            Series::new(columns::YHAT_LOWER.into(), scale(&intervals.yhat_lower)).into(),
            Series::new(columns::YHAT_UPPER.into(), scale(&intervals.yhat_upper)).into(),
            Series::new(columns::YHAT.into(), scale(&yhat)).into(),
        ]);

        Ok(DataFrame::new(output)?)
    }

    /// One period of every fitted seasonal component, weekly first.
    pub fn seasonality_profiles(&self) -> Vec<SeasonalityProfile> {
        self.seasonalities
            .iter()
            .map(|(s, coeffs)| s.profile(coeffs, self.y_scale))
            .collect()
    }
}

/// `[1, t, (t − s_j)+ ..., fourier features ...]`
fn design_row(
    date: NaiveDate,
    t: f64,
    changepoints: &[f64],
    seasonalities: &[Seasonality],
) -> Vec<f64> {
    let mut row = Vec::with_capacity(
        2 + changepoints.len() + seasonalities.iter().map(|s| s.width()).sum::<usize>(),
    );
    row.push(1.0);
    row.push(t);
    row.extend(changepoints.iter().map(|s| (t - s).max(0.0)));
    for seasonality in seasonalities {
        row.extend(seasonality.features(date));
    }
    row
}
