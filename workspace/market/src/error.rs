use thiserror::Error;

/// Errors raised while retrieving price history.
///
/// None of these escape [`crate::PriceLoader::load_data`]; the loader turns
/// every variant into a "no data" result after logging it.
#[derive(Error, Debug)]
pub enum MarketError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status and no usable body
    #[error("Unexpected HTTP status {status} for {ticker}")]
    Status { ticker: String, status: u16 },

    /// The response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider reported an error in its payload
    #[error("API error [{code}]: {description}")]
    Api { code: String, description: String },

    /// The source does not know the ticker
    #[error("Ticker not found: {0}")]
    NotFound(String),

    /// The source answered but returned no price rows
    #[error("No data returned for {0}")]
    NoData(String),

    /// The ticker is empty or contains characters no exchange uses
    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),
}

impl From<serde_json::Error> for MarketError {
    fn from(error: serde_json::Error) -> Self {
        MarketError::Parse(error.to_string())
    }
}

/// Type alias for Result with MarketError
pub type Result<T> = std::result::Result<T, MarketError>;
