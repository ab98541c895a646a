//! Conversions between price series and the two-column training table.

use chrono::{Duration, NaiveDate};
use common::{ForecastPoint, ForecastTable, PriceSeries};
use polars::prelude::*;

use crate::error::{ComputeError, Result};
use crate::forecast::columns;

/// Date column of training and forecast tables.
pub const DATE_COLUMN: &str = "ds";
/// Observed value column of the training table.
pub const VALUE_COLUMN: &str = "y";

/// Days between 1970-01-01 and `date`, the physical value of a polars Date.
pub fn epoch_days(date: NaiveDate) -> i64 {
    (date - NaiveDate::default()).num_days()
}

pub fn date_from_epoch_days(days: i64) -> NaiveDate {
    NaiveDate::default() + Duration::days(days)
}

/// Reshapes a price series into the `(ds, y)` table the forecaster trains on,
/// using the closing price as the observed value.
pub fn training_frame(series: &PriceSeries) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new(DATE_COLUMN.into(), series.dates()).into(),
        Series::new(VALUE_COLUMN.into(), series.closes()).into(),
    ])?;

    Ok(df)
}

/// A table holding only a `ds` column.
pub fn date_frame(dates: Vec<NaiveDate>) -> Result<DataFrame> {
    let df = DataFrame::new(vec![Series::new(DATE_COLUMN.into(), dates).into()])?;
    Ok(df)
}

/// Reads a Date column as calendar dates.
pub fn read_dates(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let days = df.column(name)?.cast(&DataType::Int32)?;
    let dates = days
        .i32()?
        .into_iter()
        .map(|d| d.map(|d| date_from_epoch_days(d as i64)))
        .collect();

    Ok(dates)
}

/// Reads a numeric column as `f64`, keeping nulls.
pub fn read_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = df.column(name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

/// Converts a prediction table into its transport form.
///
/// Seasonal columns are optional; every other column must be present and
/// free of nulls.
pub fn to_forecast_table(df: &DataFrame) -> Result<ForecastTable> {
    let required = |name: &str| -> Result<Vec<f64>> {
        read_values(df, name)?
            .into_iter()
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| ComputeError::Series(format!("column {} contains nulls", name)))
    };
    let optional = |name: &str| -> Result<Vec<Option<f64>>> {
        if df.get_column_index(name).is_some() {
            read_values(df, name)
        } else {
            Ok(vec![None; df.height()])
        }
    };

    let dates = read_dates(df, DATE_COLUMN)?;
    let yhat = required(columns::YHAT)?;
    let yhat_lower = required(columns::YHAT_LOWER)?;
    let yhat_upper = required(columns::YHAT_UPPER)?;
    let trend = required(columns::TREND)?;
    let trend_lower = required(columns::TREND_LOWER)?;
    let trend_upper = required(columns::TREND_UPPER)?;
    let weekly = optional("weekly")?;
    let yearly = optional("yearly")?;

    let points = dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let date = date.ok_or_else(|| {
                ComputeError::Date(format!("row {} of the forecast has no date", i))
            })?;
            Ok(ForecastPoint {
                date,
                yhat: yhat[i],
                yhat_lower: yhat_lower[i],
                yhat_upper: yhat_upper[i],
                trend: trend[i],
                trend_lower: trend_lower[i],
                trend_upper: trend_upper[i],
                weekly: weekly[i],
                yearly: yearly[i],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ForecastTable::new(points))
}
