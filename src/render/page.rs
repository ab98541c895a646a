use common::PriceSeries;

use super::charts::{components_chart, forecast_chart, price_chart};
use super::escape_html;
use super::tables::{TAIL_ROWS, forecast_tail_table, raw_tail_table};
use crate::pipeline::Report;
use crate::schemas::{MAX_YEARS, MIN_YEARS};

pub const PAGE_TITLE: &str = "Stock Prediction App";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// Values echoed back into the input form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub ticker: String,
    pub years: u32,
}

/// What the page shows below the form.
#[derive(Debug)]
pub enum DashboardBody<'a> {
    /// The loader returned nothing for the ticker
    NoData { ticker: &'a str },
    /// The horizon was outside the slider range
    InvalidHorizon(u32),
    /// Prices loaded but the forecast failed; the raw data is still shown
    ForecastFailed {
        series: &'a PriceSeries,
        error: String,
    },
    Ready(&'a Report),
    /// Nothing could be computed
    Failed(String),
}

pub fn no_data_message(ticker: &str) -> String {
    format!(
        "Error: Unable to load data for {}. Please check the stock symbol.",
        ticker
    )
}

pub fn render_dashboard(form: &FormState, body: &DashboardBody<'_>) -> String {
    let content = match body {
        DashboardBody::NoData { ticker } => error_banner(&no_data_message(ticker)),
        DashboardBody::InvalidHorizon(years) => error_banner(&format!(
            "Error: Years of prediction must be between {} and {}, got {}.",
            MIN_YEARS, MAX_YEARS, years
        )),
        DashboardBody::Failed(message) => error_banner(&format!("Error: {}", message)),
        DashboardBody::ForecastFailed { series, error } => {
            let mut html = success_banner();
            html.push_str(&raw_section(series));
            html.push_str(&error_banner(&format!("Error: {}", error)));
            html
        }
        DashboardBody::Ready(report) => {
            let mut html = success_banner();
            html.push_str(&raw_section(&report.series));
            html.push_str(&forecast_section(report));
            html
        }
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{plotly}" charset="utf-8"></script>
<style>
body {{ font-family: sans-serif; margin: 0 auto; max-width: 1100px; padding: 1rem 2rem; }}
form {{ display: flex; flex-direction: column; gap: 0.5rem; max-width: 420px; }}
.banner {{ padding: 0.75rem 1rem; border-radius: 0.4rem; margin: 1rem 0; }}
.banner.success {{ background: #e6f4ea; color: #1e6b34; }}
.banner.error {{ background: #fdecea; color: #8a1c1c; }}
.data-table {{ border-collapse: collapse; font-size: 0.9rem; }}
.data-table th, .data-table td {{ border: 1px solid #ddd; padding: 0.25rem 0.6rem; text-align: right; }}
</style>
</head>
<body>
<h1>{title}</h1>
{form}
{content}
</body>
</html>
"#,
        title = PAGE_TITLE,
        plotly = PLOTLY_JS,
        form = input_form(form),
        content = content,
    )
}

fn input_form(form: &FormState) -> String {
    let years = form.years.clamp(MIN_YEARS, MAX_YEARS);
    format!(
        r#"<form method="get" action="/">
<label for="ticker">Enter stock symbol (e.g., AAPL, TATAMOTORS.BO):</label>
<input type="text" id="ticker" name="ticker" value="{ticker}">
<label for="years">Years of prediction: <output id="years-value" for="years">{years}</output></label>
<input type="range" id="years" name="years" min="{min}" max="{max}" step="1" value="{years}" oninput="document.getElementById('years-value').value = this.value" onchange="this.form.submit()">
<button type="submit">Predict</button>
</form>"#,
        ticker = escape_html(&form.ticker),
        years = years,
        min = MIN_YEARS,
        max = MAX_YEARS,
    )
}

fn success_banner() -> String {
    "<div class=\"banner success\">Data loaded successfully!</div>\n".to_string()
}

fn error_banner(message: &str) -> String {
    format!(
        "<div class=\"banner error\" role=\"alert\">{}</div>\n",
        escape_html(message)
    )
}

fn raw_section(series: &PriceSeries) -> String {
    format!(
        "<section id=\"raw\">\n<h2>Raw Data</h2>\n{}{}</section>\n",
        raw_tail_table(series.tail(TAIL_ROWS)),
        price_chart(series),
    )
}

fn forecast_section(report: &Report) -> String {
    format!(
        "<section id=\"forecast\">\n<h2>Forecast Data</h2>\n{}<p>Forecast Data</p>\n{}<p>Forecast Component</p>\n{}</section>\n",
        forecast_tail_table(report.table.tail(TAIL_ROWS)),
        forecast_chart(&report.series, &report.table),
        components_chart(&report.table, &report.seasonalities),
    )
}
