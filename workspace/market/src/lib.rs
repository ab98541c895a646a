//! Market data retrieval: price sources and the memoising loader.

pub mod error;
pub mod fixtures;
pub mod loader;
pub mod source;
pub mod yahoo;

pub use error::{MarketError, Result};
pub use loader::{LoaderSettings, PriceLoader};
pub use source::{FixturePriceSource, PriceSource, normalize_ticker};
pub use yahoo::{DEFAULT_BASE_URL, YahooChartSource};
