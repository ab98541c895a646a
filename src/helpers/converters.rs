use common::PriceSeries;
use polars::prelude::*;

/// Last `n` price records as a table with the usual OHLCV headers
pub fn price_tail_frame(series: &PriceSeries, n: usize) -> PolarsResult<DataFrame> {
    let tail = series.tail(n);
    let column = |name: &str, values: Vec<f64>| -> Column { Series::new(name.into(), values).into() };

    DataFrame::new(vec![
        Series::new("Date".into(), tail.iter().map(|r| r.date).collect::<Vec<_>>()).into(),
        column("Open", tail.iter().map(|r| r.open).collect()),
        column("High", tail.iter().map(|r| r.high).collect()),
        column("Low", tail.iter().map(|r| r.low).collect()),
        column("Close", tail.iter().map(|r| r.close).collect()),
        column("Adj Close", tail.iter().map(|r| r.adj_close).collect()),
        Series::new("Volume".into(), tail.iter().map(|r| r.volume).collect::<Vec<_>>()).into(),
    ])
}

/// Last `n` rows of a prediction table, every column kept
pub fn forecast_tail_frame(forecast: &DataFrame, n: usize) -> DataFrame {
    forecast.tail(Some(n))
}
