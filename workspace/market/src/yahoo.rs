//! Yahoo Finance chart endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use common::{PriceRecord, PriceSeries};
use serde::Deserialize;
use tracing::{debug, instrument, trace, warn};

use crate::error::{MarketError, Result};
use crate::source::PriceSource;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Daily history from the Yahoo Finance v8 chart API.
#[derive(Debug, Clone)]
pub struct YahooChartSource {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PriceSource for YahooChartSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    #[instrument(skip(self))]
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let url = format!("{}/{}", self.base_url, ticker);
        let period1 = midnight_timestamp(start).to_string();
        let period2 = midnight_timestamp(end).to_string();
        debug!("Requesting {} from {} to {}", url, start, end);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "div,splits"),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        trace!("Yahoo answered {} with {} bytes", status, body.len());

        match parse_chart(ticker, &body) {
            // Unknown symbols come back as 404 with an error payload; prefer the
            // payload's description over the bare status.
            Err(MarketError::Parse(reason)) if !status.is_success() => {
                warn!("Unparseable {} response for {}: {}", status, ticker, reason);
                Err(MarketError::Status {
                    ticker: ticker.to_string(),
                    status: status.as_u16(),
                })
            }
            other => other,
        }
    }
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Turns a chart payload into a price series.
///
/// Rows without an open or close (halted days, the in-progress session) are
/// dropped. When two rows land on the same local date the later one wins.
pub(crate) fn parse_chart(ticker: &str, body: &str) -> Result<PriceSeries> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        return Err(MarketError::Api {
            code: error.code,
            description: error.description,
        });
    }

    let data = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| MarketError::NoData(ticker.to_string()))?;

    let offset = data.meta.map(|m| m.gmtoffset).unwrap_or_default();
    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = data
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut records: Vec<PriceRecord> = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(open), Some(close)) = (field(&quote.open), field(&quote.close)) else {
            trace!("Dropping incomplete row at index {}", i);
            continue;
        };
        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| MarketError::Parse(format!("Invalid timestamp {} at row {}", ts, i)))?
            .date_naive();

        let record = PriceRecord {
            date,
            open,
            high: field(&quote.high).unwrap_or(open.max(close)),
            low: field(&quote.low).unwrap_or(open.min(close)),
            close,
            adj_close: field(&adjclose).unwrap_or(close),
            volume: quote.volume.get(i).copied().flatten().unwrap_or_default(),
        };

        match records.last_mut() {
            Some(last) if last.date == record.date => *last = record,
            _ => records.push(record),
        }
    }

    if records.is_empty() {
        return Err(MarketError::NoData(ticker.to_string()));
    }

    Ok(PriceSeries::new(ticker, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    // 2024-01-02 and 2024-01-03 at 14:30 UTC (09:30 New York), then a null row.
    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "gmtoffset": -18000},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, 184.22, null],
                        "high": [188.44, 185.88, null],
                        "low": [183.89, 183.43, null],
                        "close": [185.64, 184.25, null],
                        "volume": [82488700, 58414500, null]
                    }],
                    "adjclose": [{"adjclose": [184.73, 183.35, null]}]
                }
            }],
            "error": null
        }
    }"#;

    const NOT_FOUND_BODY: &str = r#"{
        "chart": {
            "result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
        }
    }"#;

    #[test]
    fn test_parse_chart_drops_null_rows_and_applies_offset() {
        let series = parse_chart("AAPL", CHART_BODY).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.records[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series.records[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(series.records[0].open, 187.15);
        assert_eq!(series.records[1].close, 184.25);
        assert_eq!(series.records[1].adj_close, 183.35);
        assert_eq!(series.records[0].volume, 82_488_700);
    }

    #[test]
    fn test_parse_chart_maps_api_error() {
        let err = parse_chart("NOTAREALTICKER", NOT_FOUND_BODY).unwrap_err();
        assert!(matches!(err, MarketError::Api { ref code, .. } if code == "Not Found"));
    }

    #[test]
    fn test_parse_chart_empty_result_is_no_data() {
        let body = r#"{"chart": {"result": [{"meta": {"gmtoffset": 0}, "indicators": {"quote": [{}]}}], "error": null}}"#;
        assert!(matches!(parse_chart("X", body), Err(MarketError::NoData(_))));
        assert!(matches!(parse_chart("X", "<html>"), Err(MarketError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_history_against_mock_server() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/AAPL")
                    .query_param("interval", "1d")
                    .query_param("period1", "1704067200")
                    .query_param("period2", "1704326400");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(CHART_BODY);
            })
            .await;

        let source = YahooChartSource::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let series = source
            .fetch_history(
                "AAPL",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(series.ticker, "AAPL");
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_history_unknown_symbol_reports_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/NOTAREALTICKER");
                then.status(404)
                    .header("content-type", "application/json")
                    .body(NOT_FOUND_BODY);
            })
            .await;

        let source = YahooChartSource::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let err = source
            .fetch_history(
                "NOTAREALTICKER",
                NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MarketError::Api { .. }));
    }

    #[tokio::test]
    async fn test_fetch_history_non_json_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/AAPL");
                then.status(503).body("Service Unavailable");
            })
            .await;

        let source = YahooChartSource::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let err = source
            .fetch_history(
                "AAPL",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MarketError::Status { status: 503, .. }));
    }
}
