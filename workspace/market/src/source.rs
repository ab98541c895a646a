use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::PriceSeries;
use tracing::{debug, instrument};

use crate::error::{MarketError, Result};

/// Longest ticker we pass on to a provider.
const MAX_TICKER_LEN: usize = 20;

/// A provider of daily price history.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetches daily records for `ticker` with `start <= date < end`.
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries>;
}

/// Canonical form of a user supplied ticker: trimmed and upper-cased.
///
/// Exchange suffixes (`TATAMOTORS.BO`), index carets (`^GSPC`), currency
/// pairs (`EURUSD=X`) and class shares (`BRK-B`) are accepted.
pub fn normalize_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim().to_uppercase();
    let valid_chars = ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_'));

    if ticker.is_empty() || ticker.len() > MAX_TICKER_LEN || !valid_chars {
        return Err(MarketError::InvalidTicker(raw.to_string()));
    }
    Ok(ticker)
}

/// In-memory source serving fixed series, keyed by normalised ticker.
#[derive(Debug, Default)]
pub struct FixturePriceSource {
    series: HashMap<String, PriceSeries>,
    calls: AtomicUsize,
}

impl FixturePriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a series under its own ticker.
    pub fn with_series(mut self, series: PriceSeries) -> Self {
        let key = series.ticker.to_uppercase();
        self.series.insert(key, series);
        self
    }

    /// Number of fetches served so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for FixturePriceSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    #[instrument(skip(self))]
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let series = self
            .series
            .get(&ticker.to_uppercase())
            .ok_or_else(|| MarketError::NotFound(ticker.to_string()))?;

        let records: Vec<_> = series
            .records
            .iter()
            .filter(|r| r.date >= start && r.date < end)
            .cloned()
            .collect();
        debug!("Fixture source serving {} records for {}", records.len(), ticker);

        Ok(PriceSeries::new(series.ticker.clone(), records))
    }
}
