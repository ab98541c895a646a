use common::{
    DateRange, ForecastPoint, ForecastTable, PriceRecord, PriceSeries, ProfilePoint,
    SeasonalityProfile,
};
use compute::ForecastConfig;
use market::PriceLoader;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::Validate;

pub use common::ApiResponse;

/// Smallest forecast horizon offered, in years
pub const MIN_YEARS: u32 = 1;
/// Largest forecast horizon offered, in years
pub const MAX_YEARS: u32 = 4;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Memoising price loader
    pub loader: Arc<PriceLoader>,
    /// Settings applied to every forecast
    pub forecast: ForecastConfig,
    /// Ticker pre-filled in the dashboard form
    pub default_ticker: String,
}

/// Query parameters of the dashboard page
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct DashboardQuery {
    /// Stock ticker (default: configured ticker, usually AAPL)
    pub ticker: Option<String>,
    /// Forecast horizon in years (default: 1). Kept as text so a malformed
    /// value is reported on the page rather than rejected by the extractor.
    pub years: Option<String>,
}

impl DashboardQuery {
    /// Requested horizon; missing or blank means [`MIN_YEARS`].
    pub fn horizon(&self) -> Result<u32, String> {
        match self.years.as_deref().map(str::trim) {
            None | Some("") => Ok(MIN_YEARS),
            Some(raw) => raw.parse().map_err(|_| {
                format!(
                    "Years of prediction must be a whole number between {} and {}, got '{}'.",
                    MIN_YEARS, MAX_YEARS, raw
                )
            }),
        }
    }
}

/// Query parameters of the forecast endpoint
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct ForecastQuery {
    /// Forecast horizon in years, 1 to 4 (default: 1)
    #[validate(range(min = 1, max = 4))]
    pub years: Option<u32>,
}

/// Forecast of a ticker's closing price
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForecastResponse {
    pub ticker: String,
    /// Days forecast past the last observation
    pub horizon_days: usize,
    /// Observations the model was fitted on
    pub history_rows: usize,
    pub forecast: ForecastTable,
    /// One period of every fitted seasonal component
    pub seasonalities: Vec<SeasonalityProfile>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Name of the market data source
    pub data_source: String,
    /// Number of memoised price series
    pub cached_series: u64,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::stocks::get_stock_history,
        crate::handlers::stocks::get_stock_forecast,
    ),
    components(
        schemas(
            ApiResponse<PriceSeries>,
            ApiResponse<ForecastResponse>,
            ErrorResponse,
            HealthResponse,
            ForecastQuery,
            ForecastResponse,
            PriceSeries,
            PriceRecord,
            ForecastTable,
            ForecastPoint,
            SeasonalityProfile,
            ProfilePoint,
            DateRange,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "stocks", description = "Price history and forecast endpoints"),
    ),
    info(
        title = "StockCast API",
        description = "Stock price history and closing price forecasts",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
