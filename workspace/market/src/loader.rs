use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use common::PriceSeries;
use moka::future::Cache;
use tracing::{debug, info, instrument, warn};

use crate::source::{PriceSource, normalize_ticker};

/// Settings for [`PriceLoader`].
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    /// First date requested from the source
    pub history_start: NaiveDate,
    /// Maximum number of tickers kept in memory
    pub cache_capacity: u64,
    /// How long a loaded series is served without refetching
    pub cache_ttl: Duration,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            history_start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
            cache_capacity: 256,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Loads price history for a ticker, memoised per ticker.
///
/// The loader has a single failure path: anything that goes wrong while
/// fetching (unknown ticker, network failure, empty payload) is logged and
/// reported as `None`. Only successful loads are cached, so a transient
/// failure does not stick to the ticker.
#[derive(Clone)]
pub struct PriceLoader {
    source: Arc<dyn PriceSource>,
    history_start: NaiveDate,
    today: Option<NaiveDate>,
    cache: Cache<String, Arc<PriceSeries>>,
}

impl fmt::Debug for PriceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceLoader")
            .field("source", &self.source.name())
            .field("history_start", &self.history_start)
            .field("today", &self.today)
            .field("cached_entries", &self.cache.entry_count())
            .finish()
    }
}

impl PriceLoader {
    pub fn new(source: Arc<dyn PriceSource>, settings: LoaderSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.cache_capacity)
            .time_to_live(settings.cache_ttl)
            .build();

        Self {
            source,
            history_start: settings.history_start,
            today: None,
            cache,
        }
    }

    /// Pins the end of the fetch range instead of using the current date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn history_start(&self) -> NaiveDate {
        self.history_start
    }

    /// Exclusive end of the fetch range.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Returns the daily history of `ticker` from the configured start date
    /// up to today, or `None` when no usable data could be retrieved.
    #[instrument(skip(self))]
    pub async fn load_data(&self, ticker: &str) -> Option<Arc<PriceSeries>> {
        let ticker = match normalize_ticker(ticker) {
            Ok(ticker) => ticker,
            Err(e) => {
                warn!("Rejecting ticker before fetch: {}", e);
                return None;
            }
        };

        let start = self.history_start;
        let end = self.today();
        if end <= start {
            warn!("Empty fetch range {} to {}", start, end);
            return None;
        }

        let source = Arc::clone(&self.source);
        let key = ticker.clone();
        self.cache
            .optionally_get_with(key, async move {
                debug!("Cache miss, fetching {} from {}", ticker, source.name());
                match source.fetch_history(&ticker, start, end).await {
                    Ok(series) if !series.is_empty() => {
                        info!("Loaded {} records for {}", series.len(), ticker);
                        Some(Arc::new(series))
                    }
                    Ok(_) => {
                        warn!("Source {} returned no rows for {}", source.name(), ticker);
                        None
                    }
                    Err(e) => {
                        warn!("Failed to load {} from {}: {}", ticker, source.name(), e);
                        None
                    }
                }
            })
            .await
    }

    /// Drops the cached series of `ticker`, if any.
    pub async fn invalidate(&self, ticker: &str) {
        if let Ok(key) = normalize_ticker(ticker) {
            self.cache.invalidate(&key).await;
        }
    }

    /// Number of tickers currently memoised.
    pub async fn cached_entries(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}
