#[cfg(test)]
pub mod test_utils {
    use crate::config::AppConfig;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use chrono::NaiveDate;
    use market::fixtures::synthetic_series;
    use market::{FixturePriceSource, PriceLoader, PriceSource};
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Fixed "today" so fetch ranges and forecast dates are reproducible.
    pub fn test_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    /// Configuration used by tests: fewer simulated paths, pinned seed.
    pub fn test_config() -> AppConfig {
        AppConfig {
            uncertainty_samples: 100,
            seed: 7,
            ..AppConfig::default()
        }
    }

    /// Source serving synthetic AAPL and MSFT histories.
    pub fn test_price_source() -> FixturePriceSource {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let days = (test_today() - start).num_days() + 30;
        FixturePriceSource::new()
            .with_series(synthetic_series("AAPL", start, days))
            .with_series(synthetic_series("MSFT", start, days))
    }

    /// Create AppState over an arbitrary source for testing
    pub fn setup_test_app_state_with_source(source: Arc<dyn PriceSource>) -> AppState {
        let config = test_config();
        let loader = PriceLoader::new(source, config.loader_settings()).with_today(test_today());

        AppState {
            loader: Arc::new(loader),
            forecast: config.forecast_config(),
            default_ticker: config.default_ticker,
        }
    }

    /// Create AppState for testing
    pub fn setup_test_app_state() -> AppState {
        setup_test_app_state_with_source(Arc::new(test_price_source()))
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub fn setup_test_app() -> Router {
        create_router(setup_test_app_state())
    }

    /// Create axum app over a given state, e.g. to inspect its loader afterwards
    pub fn setup_test_app_with_state(state: AppState) -> Router {
        create_router(state)
    }
}
