use common::{ForecastPoint, PriceRecord};

use super::escape_html;

/// Rows shown in the raw and forecast tail tables.
pub const TAIL_ROWS: usize = 5;

/// Last rows of the price history, newest last.
pub fn raw_tail_table(records: &[PriceRecord]) -> String {
    let header = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.date.to_string(),
                format_price(r.open),
                format_price(r.high),
                format_price(r.low),
                format_price(r.close),
                format_price(r.adj_close),
                r.volume.to_string(),
            ]
        })
        .collect();

    html_table("raw-data", &header, &rows)
}

/// Last rows of the forecast: point estimate, interval and trend.
pub fn forecast_tail_table(points: &[ForecastPoint]) -> String {
    let header = ["ds", "yhat", "yhat_lower", "yhat_upper", "trend"];
    let rows: Vec<Vec<String>> = points
        .iter()
        .map(|p| {
            vec![
                p.date.to_string(),
                format_price(p.yhat),
                format_price(p.yhat_lower),
                format_price(p.yhat_upper),
                format_price(p.trend),
            ]
        })
        .collect();

    html_table("forecast-data", &header, &rows)
}

fn format_price(value: f64) -> String {
    format!("{:.4}", value)
}

fn html_table(id: &str, header: &[&str], rows: &[Vec<String>]) -> String {
    let mut html = format!("<table id=\"{}\" class=\"data-table\">\n<thead><tr>", id);
    for name in header {
        html.push_str(&format!("<th>{}</th>", escape_html(name)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}
