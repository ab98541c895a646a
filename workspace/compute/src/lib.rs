pub mod error;
pub mod forecast;
pub mod frame;

pub use error::{ComputeError, Result};
pub use forecast::{FittedForecaster, ForecastConfig, Forecaster, SeasonalityToggle};
pub use frame::{to_forecast_table, training_frame};

/// Days per forecast year; leap days are not accounted for.
pub const DAYS_PER_YEAR: usize = 365;

/// Number of days to forecast past the last observation for a horizon in years.
pub fn forecast_horizon(years: u32) -> usize {
    years as usize * DAYS_PER_YEAR
}

/// Returns a pre-configured forecaster that will be used most of the time.
///
/// Uses the provided configuration or the library defaults when none is given.
pub fn default_forecaster(config: Option<ForecastConfig>) -> Forecaster {
    Forecaster::new(config.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use frame::read_dates;
    use market::fixtures::synthetic_series;

    #[test]
    fn test_forecast_horizon() {
        assert_eq!(forecast_horizon(1), 365);
        assert_eq!(forecast_horizon(4), 1460);
    }

    /// End to end: a year of prices forecast two years ahead ends exactly
    /// `2 * 365` days after the last observation.
    #[test]
    fn test_default_forecaster_end_date() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = synthetic_series("AAPL", start, 365);
        let df = training_frame(&series).unwrap();

        let fitted = default_forecaster(Some(ForecastConfig::default().with_uncertainty_samples(100)))
            .fit(&df)
            .unwrap();
        let horizon = forecast_horizon(2);
        let forecast = fitted
            .predict(&fitted.make_future_frame(horizon, true).unwrap())
            .unwrap();

        assert!(forecast.height() >= series.len());
        assert_eq!(forecast.height(), series.len() + horizon);
        let dates = read_dates(&forecast, frame::DATE_COLUMN).unwrap();
        assert_eq!(
            dates.last().copied().flatten(),
            series.last_date().map(|d| d + Duration::days(horizon as i64))
        );
    }

    #[test]
    fn test_default_forecaster_uses_defaults() {
        assert_eq!(default_forecaster(None).config(), &ForecastConfig::default());
    }
}
