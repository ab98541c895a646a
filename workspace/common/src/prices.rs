use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::DateRange;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PriceRecord {
    /// Trading date in the exchange's local time
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Close adjusted for splits and dividends
    pub adj_close: f64,
    pub volume: u64,
}

/// Daily price history for a single ticker, ordered by date.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PriceSeries {
    /// Ticker symbol the history was fetched for
    pub ticker: String,
    /// Records in non-decreasing date order
    pub records: Vec<PriceRecord>,
}

impl PriceSeries {
    /// Builds a series, restoring date order if the input is shuffled.
    pub fn new(ticker: impl Into<String>, mut records: Vec<PriceRecord>) -> Self {
        if !records.windows(2).all(|w| w[0].date <= w[1].date) {
            records.sort_by_key(|r| r.date);
        }
        Self {
            ticker: ticker.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    pub fn date_range(&self) -> Option<DateRange> {
        Some(DateRange::new(self.first_date()?, self.last_date()?))
    }

    /// The last `n` records (fewer when the series is shorter).
    pub fn tail(&self, n: usize) -> &[PriceRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.open).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.close).collect()
    }
}
