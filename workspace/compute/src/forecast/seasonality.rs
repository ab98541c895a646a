//! Fourier-series seasonal components.

use std::f64::consts::PI;

use chrono::{Datelike, Duration, NaiveDate};
use common::{ProfilePoint, SeasonalityProfile};

use super::config::SeasonalityToggle;
use crate::frame::epoch_days;

/// A periodic component expressed as a truncated Fourier series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    /// Period length in days
    pub period: f64,
    /// Number of sine/cosine pairs
    pub order: usize,
}

pub const YEARLY: Seasonality = Seasonality {
    name: "yearly",
    period: 365.25,
    order: 10,
};

pub const WEEKLY: Seasonality = Seasonality {
    name: "weekly",
    period: 7.0,
    order: 3,
};

impl Seasonality {
    /// Number of regression columns contributed by this component.
    pub fn width(&self) -> usize {
        2 * self.order
    }

    /// Feature row at `date`: `sin(2πnt/P), cos(2πnt/P)` for n = 1..=order,
    /// with t counted in days since the Unix epoch.
    pub fn features(&self, date: NaiveDate) -> Vec<f64> {
        let t = epoch_days(date) as f64;
        (1..=self.order)
            .flat_map(|n| {
                let angle = 2.0 * PI * n as f64 * t / self.period;
                [angle.sin(), angle.cos()]
            })
            .collect()
    }

    /// Component value at `date` for fitted coefficients (in scaled units).
    pub fn evaluate(&self, date: NaiveDate, coefficients: &[f64]) -> f64 {
        self.features(date)
            .iter()
            .zip(coefficients)
            .map(|(x, beta)| x * beta)
            .sum()
    }

    /// One period of the component, sampled daily from a reference Sunday.
    pub fn profile(&self, coefficients: &[f64], y_scale: f64) -> SeasonalityProfile {
        // 2017-01-01 is a Sunday and starts a non-leap year.
        let origin = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default();
        let days = self.period.floor() as i64;

        let points = (0..days)
            .map(|offset| {
                let date = origin + Duration::days(offset);
                let label = if self.period <= 7.0 {
                    date.weekday().to_string()
                } else {
                    date.format("%B %-d").to_string()
                };
                ProfilePoint {
                    x: offset as f64,
                    label,
                    value: self.evaluate(date, coefficients) * y_scale,
                }
            })
            .collect();

        SeasonalityProfile {
            name: self.name.to_string(),
            period_days: self.period,
            points,
        }
    }
}

/// Decides which seasonal components to fit for a history.
///
/// Under `Auto`, yearly seasonality needs two years of history; weekly
/// seasonality needs two weeks of history sampled more often than weekly.
pub fn active_seasonalities(
    dates: &[NaiveDate],
    yearly: SeasonalityToggle,
    weekly: SeasonalityToggle,
) -> Vec<Seasonality> {
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        return Vec::new();
    };
    let span = (*last - *first).num_days();
    let min_spacing = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .filter(|d| *d > 0)
        .min()
        .unwrap_or(i64::MAX);

    let resolve = |toggle: SeasonalityToggle, auto: bool| match toggle {
        SeasonalityToggle::Auto => auto,
        SeasonalityToggle::Enabled => true,
        SeasonalityToggle::Disabled => false,
    };

    let mut active = Vec::new();
    if resolve(weekly, span >= 14 && min_spacing < 7) {
        active.push(WEEKLY);
    }
    if resolve(yearly, span >= 730) {
        active.push(YEARLY);
    }
    active
}
