//! Deterministic price histories for tests and offline runs.

use std::f64::consts::PI;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use common::{PriceRecord, PriceSeries};

/// Builds a business-day series spanning `calendar_days` days from `start`.
///
/// Closes follow a gentle upward trend, a mid-week bump and a yearly wave,
/// so forecasts fitted on it have a visible trend and both seasonalities.
pub fn synthetic_series(ticker: &str, start: NaiveDate, calendar_days: i64) -> PriceSeries {
    let records = (0..calendar_days)
        .map(|offset| start + Duration::days(offset))
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .map(|date| {
            let day = (date - start).num_days() as f64;
            let weekly = match date.weekday() {
                Weekday::Tue | Weekday::Wed | Weekday::Thu => 0.8,
                _ => -0.6,
            };
            let yearly = 4.0 * (2.0 * PI * date.ordinal0() as f64 / 365.25).sin();
            let close = 100.0 + 0.05 * day + weekly + yearly;
            synthetic_record(date, close, day as u64)
        })
        .collect();

    PriceSeries::new(ticker, records)
}

fn synthetic_record(date: NaiveDate, close: f64, day: u64) -> PriceRecord {
    let open = close - 0.3;
    PriceRecord {
        date,
        open,
        high: open.max(close) + 0.5,
        low: open.min(close) - 0.5,
        close,
        adj_close: close,
        volume: 1_000_000 + day * 10,
    }
}
