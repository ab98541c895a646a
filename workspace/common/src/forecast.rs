use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::DateRange;

/// One row of a forecast: point estimate, interval and decomposition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Predicted value
    pub yhat: f64,
    /// Lower bound of the uncertainty interval
    pub yhat_lower: f64,
    /// Upper bound of the uncertainty interval
    pub yhat_upper: f64,
    pub trend: f64,
    pub trend_lower: f64,
    pub trend_upper: f64,
    /// Weekly seasonal contribution, absent when weekly seasonality is off
    pub weekly: Option<f64>,
    /// Yearly seasonal contribution, absent when yearly seasonality is off
    pub yearly: Option<f64>,
}

/// Forecast covering the fitted history plus the requested horizon.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ForecastTable {
    pub points: Vec<ForecastPoint>,
}

impl ForecastTable {
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn date_range(&self) -> Option<DateRange> {
        Some(DateRange::new(
            self.points.first()?.date,
            self.points.last()?.date,
        ))
    }

    pub fn tail(&self, n: usize) -> &[ForecastPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }
}

/// A single sample of a seasonal component over one period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProfilePoint {
    /// Position within the period (day of week or day of year)
    pub x: f64,
    /// Human readable position, e.g. "Mon" or "March 1"
    pub label: String,
    pub value: f64,
}

/// One full period of a fitted seasonal component.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SeasonalityProfile {
    /// Component name ("weekly", "yearly")
    pub name: String,
    pub period_days: f64,
    pub points: Vec<ProfilePoint>,
}
