//! One dashboard interaction: load prices, fit, forecast.

use common::{ForecastTable, PriceSeries, SeasonalityProfile};
use compute::{
    ComputeError, default_forecaster, forecast_horizon, to_forecast_table, training_frame,
};
use polars::prelude::DataFrame;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::schemas::{AppState, MAX_YEARS, MIN_YEARS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub ticker: String,
    pub years: u32,
}

/// Everything rendered after a successful run.
#[derive(Debug, Clone)]
pub struct Report {
    pub series: Arc<PriceSeries>,
    pub training_rows: usize,
    pub horizon_days: usize,
    /// Full prediction table, history plus horizon
    pub forecast: DataFrame,
    pub table: ForecastTable,
    pub seasonalities: Vec<SeasonalityProfile>,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// The loader returned nothing for the ticker; no forecast was attempted
    NoData { ticker: String },
    Ready(Box<Report>),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Forecast horizon must be between 1 and 4 years, got {0}")]
    InvalidHorizon(u32),

    /// Prices were loaded but the model could not produce a forecast
    #[error("Unable to forecast {ticker}: {source}")]
    Forecast {
        ticker: String,
        series: Arc<PriceSeries>,
        #[source]
        source: ComputeError,
    },

    #[error("Forecast task failed: {0}")]
    Task(String),
}

/// Runs the pipeline top to bottom for one request.
///
/// Fitting is CPU bound and runs on the blocking pool.
#[instrument(skip(state), fields(ticker = %request.ticker, years = request.years))]
pub async fn run_pipeline(
    state: &AppState,
    request: &PipelineRequest,
) -> Result<PipelineOutcome, PipelineError> {
    if !(MIN_YEARS..=MAX_YEARS).contains(&request.years) {
        return Err(PipelineError::InvalidHorizon(request.years));
    }

    let Some(series) = state.loader.load_data(&request.ticker).await else {
        warn!("No price data for {}", request.ticker);
        return Ok(PipelineOutcome::NoData {
            ticker: request.ticker.trim().to_string(),
        });
    };
    debug!("Loaded {} price records", series.len());

    let horizon_days = forecast_horizon(request.years);
    let config = state.forecast.clone();
    let training_series = Arc::clone(&series);

    let fitted = tokio::task::spawn_blocking(move || -> Result<_, ComputeError> {
        let training = training_frame(&training_series)?;
        let fitted = default_forecaster(Some(config)).fit(&training)?;
        let future = fitted.make_future_frame(horizon_days, true)?;
        let forecast = fitted.predict(&future)?;
        let table = to_forecast_table(&forecast)?;
        Ok((fitted.history_rows(), forecast, table, fitted.seasonality_profiles()))
    })
    .await
    .map_err(|e| PipelineError::Task(e.to_string()))?;

    match fitted {
        Ok((training_rows, forecast, table, seasonalities)) => {
            info!(
                training_rows,
                forecast_rows = table.len(),
                "Forecast ready for {}",
                series.ticker
            );
            Ok(PipelineOutcome::Ready(Box::new(Report {
                series,
                training_rows,
                horizon_days,
                forecast,
                table,
                seasonalities,
            })))
        }
        Err(source) => {
            warn!("Forecast failed for {}: {}", series.ticker, source);
            Err(PipelineError::Forecast {
                ticker: series.ticker.clone(),
                series,
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::{setup_test_app_state, test_today};
    use chrono::Duration;
    use common::PriceRecord;
    use market::FixturePriceSource;

    fn request(ticker: &str, years: u32) -> PipelineRequest {
        PipelineRequest {
            ticker: ticker.to_string(),
            years,
        }
    }

    #[tokio::test]
    async fn test_unknown_ticker_yields_no_data() {
        let state = setup_test_app_state();

        let outcome = run_pipeline(&state, &request(" nope ", 1)).await.unwrap();

        match outcome {
            PipelineOutcome::NoData { ticker } => assert_eq!(ticker, "nope"),
            other => panic!("expected NoData, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forecast_ends_horizon_after_last_observation() {
        let state = setup_test_app_state();

        let outcome = run_pipeline(&state, &request("aapl", 2)).await.unwrap();

        let PipelineOutcome::Ready(report) = outcome else {
            panic!("expected a forecast");
        };
        assert_eq!(report.horizon_days, 730);
        assert_eq!(report.training_rows, report.series.len());
        assert!(report.table.len() >= report.series.len());
        assert_eq!(report.forecast.height(), report.table.len());

        let last_observed = report.series.last_date().unwrap();
        let last_forecast = report.table.points.last().unwrap().date;
        assert_eq!(last_forecast, last_observed + Duration::days(730));
        assert!(last_observed < test_today());
        assert!(!report.seasonalities.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_horizon() {
        let state = setup_test_app_state();

        for years in [0, 5] {
            let err = run_pipeline(&state, &request("AAPL", years)).await.unwrap_err();
            assert!(matches!(err, PipelineError::InvalidHorizon(y) if y == years));
        }
    }

    #[tokio::test]
    async fn test_single_observation_is_a_forecast_error() {
        let date = test_today() - Duration::days(3);
        let series = PriceSeries::new(
            "ONE",
            vec![PriceRecord {
                date,
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                adj_close: 1.0,
                volume: 10,
            }],
        );
        let source = FixturePriceSource::new().with_series(series);
        let state =
            crate::test_utils::test_utils::setup_test_app_state_with_source(Arc::new(source));

        let err = run_pipeline(&state, &request("ONE", 1)).await.unwrap_err();

        match err {
            PipelineError::Forecast { ticker, series, source } => {
                assert_eq!(ticker, "ONE");
                assert_eq!(series.len(), 1);
                assert!(matches!(source, ComputeError::InsufficientData { actual: 1, .. }));
            }
            other => panic!("expected a forecast error, got {:?}", other),
        }
    }
}
