use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use compute::ForecastConfig;
use config::{Config, Environment};
use market::fixtures::synthetic_series;
use market::{
    DEFAULT_BASE_URL, FixturePriceSource, LoaderSettings, PriceLoader, PriceSource,
    YahooChartSource,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Prefix of the environment variables read by [`AppConfig::load`].
pub const ENV_PREFIX: &str = "STOCKCAST";

/// Tickers served by the offline fixture source, besides the default ticker.
const FIXTURE_TICKERS: [&str; 4] = ["AAPL", "MSFT", "GOOG", "AMZN"];

/// Where price history comes from.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Yahoo Finance chart API
    #[default]
    Yahoo,
    /// Deterministic synthetic series, no network access
    Fixture,
}

/// Application configuration, read from `STOCKCAST_*` variables over built-in defaults.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Bind address for the web server, `IP:PORT`
    pub bind_address: String,
    /// First day of the downloaded history
    pub history_start: NaiveDate,
    /// Ticker pre-filled in the dashboard form
    pub default_ticker: String,
    pub data_source: DataSource,
    /// Base URL of the Yahoo Finance chart endpoint
    pub yahoo_base_url: String,
    pub request_timeout_secs: u64,
    /// Maximum number of memoised price series
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
    /// Coverage of the forecast uncertainty interval
    pub interval_width: f64,
    /// Simulated trend paths per forecast; 0 disables the interval
    pub uncertainty_samples: usize,
    pub seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let forecast = ForecastConfig::default();
        let loader = LoaderSettings::default();
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            history_start: loader.history_start,
            default_ticker: "AAPL".to_string(),
            data_source: DataSource::Yahoo,
            yahoo_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            cache_capacity: loader.cache_capacity,
            cache_ttl_secs: loader.cache_ttl.as_secs(),
            interval_width: forecast.interval_width,
            uncertainty_samples: forecast.uncertainty_samples,
            seed: forecast.seed,
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then layers the environment over the defaults.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("history_start", defaults.history_start.to_string())?
            .set_default("default_ticker", defaults.default_ticker)?
            .set_default("data_source", "yahoo")?
            .set_default("yahoo_base_url", defaults.yahoo_base_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("cache_capacity", defaults.cache_capacity)?
            .set_default("cache_ttl_secs", defaults.cache_ttl_secs)?
            .set_default("interval_width", defaults.interval_width)?
            .set_default("uncertainty_samples", defaults.uncertainty_samples as u64)?
            .set_default("seed", defaults.seed)?
            .add_source(environment)
            .build()
            .context("Failed to read configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration value")?;
        config.forecast_config().validate()?;
        Ok(config)
    }

    pub fn forecast_config(&self) -> ForecastConfig {
        ForecastConfig::default()
            .with_interval_width(self.interval_width)
            .with_uncertainty_samples(self.uncertainty_samples)
            .with_seed(self.seed)
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            history_start: self.history_start,
            cache_capacity: self.cache_capacity,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }
}

/// Initialize application state backed by the configured data source
pub fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    let source: Arc<dyn PriceSource> = match config.data_source {
        DataSource::Yahoo => {
            info!("Using market data from {}", config.yahoo_base_url);
            let source = YahooChartSource::new(
                config.yahoo_base_url.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )
            .context("Failed to build market data client")?;
            Arc::new(source)
        }
        DataSource::Fixture => {
            info!("Using synthetic market data");
            Arc::new(fixture_source(config))
        }
    };

    Ok(initialize_app_state_with_source(config, source))
}

/// Synthetic daily series from `history_start` through today.
fn fixture_source(config: &AppConfig) -> FixturePriceSource {
    let days = (Utc::now().date_naive() - config.history_start).num_days() + 1;
    let mut tickers: Vec<String> = FIXTURE_TICKERS.iter().map(|t| t.to_string()).collect();
    let default_ticker = config.default_ticker.trim().to_uppercase();
    if !tickers.contains(&default_ticker) {
        tickers.push(default_ticker);
    }

    tickers.into_iter().fold(FixturePriceSource::new(), |source, ticker| {
        source.with_series(synthetic_series(&ticker, config.history_start, days.max(0)))
    })
}

/// Initialize application state over an arbitrary price source
pub fn initialize_app_state_with_source(config: &AppConfig, source: Arc<dyn PriceSource>) -> AppState {
    debug!(?config, "Initializing application state");
    let loader = PriceLoader::new(source, config.loader_settings());

    AppState {
        loader: Arc::new(loader),
        forecast: config.forecast_config(),
        default_ticker: config.default_ticker.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_environment(environment(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.history_start, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(config.default_ticker, "AAPL");
        assert_eq!(config.uncertainty_samples, 1000);
        assert_eq!(config.data_source, DataSource::Yahoo);
    }

    #[test]
    fn test_data_source_selection() {
        let config =
            AppConfig::from_environment(environment(&[("STOCKCAST_DATA_SOURCE", "fixture")]))
                .unwrap();
        assert_eq!(config.data_source, DataSource::Fixture);

        let result = AppConfig::from_environment(environment(&[("STOCKCAST_DATA_SOURCE", "csv")]));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fixture_source_serves_offline_data() {
        let config = AppConfig {
            data_source: DataSource::Fixture,
            default_ticker: "nvda".to_string(),
            history_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            ..AppConfig::default()
        };

        let state = initialize_app_state(&config).unwrap();

        assert_eq!(state.loader.source_name(), "fixture");
        for ticker in ["AAPL", "MSFT", "NVDA"] {
            let series = state.loader.load_data(ticker).await;
            assert!(series.is_some_and(|s| !s.is_empty()), "{}", ticker);
        }
        assert!(state.loader.load_data("ZZZZ").await.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_environment(environment(&[
            ("STOCKCAST_BIND_ADDRESS", "127.0.0.1:8080"),
            ("STOCKCAST_HISTORY_START", "2020-06-01"),
            ("STOCKCAST_UNCERTAINTY_SAMPLES", "0"),
            ("STOCKCAST_INTERVAL_WIDTH", "0.95"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.history_start, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap());
        assert_eq!(config.forecast_config().uncertainty_samples, 0);
        assert_eq!(config.forecast_config().interval_width, 0.95);
    }

    #[test]
    fn test_invalid_interval_width_is_rejected() {
        let result =
            AppConfig::from_environment(environment(&[("STOCKCAST_INTERVAL_WIDTH", "1.5")]));
        assert!(result.is_err());
    }
}
