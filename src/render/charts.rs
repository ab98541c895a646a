//! Plotly figures rendered as inline HTML fragments.
//!
//! The page loads plotly.js once; each fragment only holds a div and the
//! script drawing into it.

use chrono::NaiveDate;
use common::{ForecastTable, PriceSeries, SeasonalityProfile};
use plotly::common::{Fill, Line, Marker, Mode, Title};
use plotly::layout::{Axis, GridPattern, Layout, LayoutGrid, RangeSlider};
use plotly::{Plot, Scatter};

pub const PRICE_CHART_ID: &str = "time-series-chart";
pub const FORECAST_CHART_ID: &str = "forecast-chart";
pub const COMPONENTS_CHART_ID: &str = "components-chart";

const FORECAST_COLOR: &str = "#0072B2";
const BAND_COLOR: &str = "rgba(0, 114, 178, 0.2)";
const SUBPLOT_HEIGHT: usize = 300;

fn date_labels(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<String> {
    dates.into_iter().map(|d| d.to_string()).collect()
}

/// Opening and closing prices over the whole history, with a range slider.
pub fn price_chart(series: &PriceSeries) -> String {
    let dates = date_labels(series.dates());
    let open = Scatter::new(dates.clone(), series.opens()).name("Stock Open");
    let close = Scatter::new(dates, series.closes()).name("Stock Close");

    let layout = Layout::new()
        .title(Title::with_text("Time Series Data"))
        .x_axis(Axis::new().range_slider(RangeSlider::new().visible(true)));

    let mut plot = Plot::new();
    plot.add_trace(open);
    plot.add_trace(close);
    plot.set_layout(layout);
    plot.to_inline_html(Some(PRICE_CHART_ID))
}

/// Observed closes as points, the fitted and projected `yhat` as a line and
/// the uncertainty interval as a shaded band.
pub fn forecast_chart(series: &PriceSeries, forecast: &ForecastTable) -> String {
    let dates = date_labels(forecast.points.iter().map(|p| p.date));
    let lower: Vec<f64> = forecast.points.iter().map(|p| p.yhat_lower).collect();
    let upper: Vec<f64> = forecast.points.iter().map(|p| p.yhat_upper).collect();
    let yhat: Vec<f64> = forecast.points.iter().map(|p| p.yhat).collect();

    let actual = Scatter::new(date_labels(series.dates()), series.closes())
        .name("Actual")
        .mode(Mode::Markers)
        .marker(Marker::new().color("black").size(3));
    let lower_bound = Scatter::new(dates.clone(), lower)
        .name("Lower bound")
        .mode(Mode::Lines)
        .line(Line::new().width(0.0))
        .show_legend(false);
    let upper_bound = Scatter::new(dates.clone(), upper)
        .name("Upper bound")
        .mode(Mode::Lines)
        .line(Line::new().width(0.0))
        .fill(Fill::ToNextY)
        .fill_color(BAND_COLOR)
        .show_legend(false);
    let predicted = Scatter::new(dates, yhat)
        .name("Predicted")
        .mode(Mode::Lines)
        .line(Line::new().color(FORECAST_COLOR).width(2.0));

    let layout = Layout::new()
        .x_axis(
            Axis::new()
                .title(Title::with_text("ds"))
                .range_slider(RangeSlider::new().visible(true)),
        )
        .y_axis(Axis::new().title(Title::with_text("y")));

    let mut plot = Plot::new();
    plot.add_trace(actual);
    plot.add_trace(lower_bound);
    plot.add_trace(upper_bound);
    plot.add_trace(predicted);
    plot.set_layout(layout);
    plot.to_inline_html(Some(FORECAST_CHART_ID))
}

/// One subplot per component: the trend with its interval, then every
/// seasonal profile (weekly before yearly).
pub fn components_chart(forecast: &ForecastTable, profiles: &[SeasonalityProfile]) -> String {
    let dates = date_labels(forecast.points.iter().map(|p| p.date));
    let trend: Vec<f64> = forecast.points.iter().map(|p| p.trend).collect();
    let lower: Vec<f64> = forecast.points.iter().map(|p| p.trend_lower).collect();
    let upper: Vec<f64> = forecast.points.iter().map(|p| p.trend_upper).collect();

    // Yearly and weekly at most, plus the trend.
    let profiles = &profiles[..profiles.len().min(2)];
    let rows = 1 + profiles.len();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(dates.clone(), lower)
            .name("trend_lower")
            .mode(Mode::Lines)
            .line(Line::new().width(0.0))
            .show_legend(false),
    );
    plot.add_trace(
        Scatter::new(dates.clone(), upper)
            .name("trend_upper")
            .mode(Mode::Lines)
            .line(Line::new().width(0.0))
            .fill(Fill::ToNextY)
            .fill_color(BAND_COLOR)
            .show_legend(false),
    );
    plot.add_trace(
        Scatter::new(dates, trend)
            .name("trend")
            .mode(Mode::Lines)
            .line(Line::new().color(FORECAST_COLOR).width(2.0)),
    );

    let mut layout = Layout::new()
        .grid(
            LayoutGrid::new()
                .rows(rows)
                .columns(1)
                .pattern(GridPattern::Independent),
        )
        .height(SUBPLOT_HEIGHT * rows)
        .show_legend(false)
        .x_axis(Axis::new().title(Title::with_text("ds")))
        .y_axis(Axis::new().title(Title::with_text("trend")));

    for (index, profile) in profiles.iter().enumerate() {
        let x_axis = format!("x{}", index + 2);
        let y_axis = format!("y{}", index + 2);
        let labels: Vec<String> = profile.points.iter().map(|p| p.label.clone()).collect();
        let values: Vec<f64> = profile.points.iter().map(|p| p.value).collect();

        plot.add_trace(
            Scatter::new(labels, values)
                .name(&profile.name)
                .mode(Mode::Lines)
                .line(Line::new().color(FORECAST_COLOR).width(2.0))
                .x_axis(&x_axis)
                .y_axis(&y_axis),
        );

        let x = Axis::new().title(Title::with_text(profile_axis_title(profile)));
        let y = Axis::new().title(Title::with_text(profile.name.as_str()));
        layout = match index {
            0 => layout.x_axis2(x).y_axis2(y),
            _ => layout.x_axis3(x).y_axis3(y),
        };
    }

    plot.set_layout(layout);
    plot.to_inline_html(Some(COMPONENTS_CHART_ID))
}

fn profile_axis_title(profile: &SeasonalityProfile) -> &'static str {
    if profile.period_days <= 7.0 {
        "Day of week"
    } else {
        "Day of year"
    }
}
