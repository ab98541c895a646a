use axum::{
    extract::{Query, State},
    response::Html,
};
use tracing::{debug, instrument, trace};

use crate::pipeline::{PipelineError, PipelineOutcome, PipelineRequest, run_pipeline};
use crate::render::{DashboardBody, FormState, render_dashboard};
use crate::schemas::{AppState, DashboardQuery, MIN_YEARS};

/// Dashboard page: input form, banner, raw data and forecast.
///
/// Every submission of the form re-runs the whole pipeline; price loads are
/// memoised by the loader, forecasts are not.
#[instrument]
pub async fn dashboard(
    Query(query): Query<DashboardQuery>,
    State(state): State<AppState>,
) -> Html<String> {
    trace!("Entering dashboard function");

    let horizon = query.horizon();
    let form = FormState {
        ticker: query
            .ticker
            .unwrap_or_else(|| state.default_ticker.clone()),
        years: horizon.as_ref().copied().unwrap_or(MIN_YEARS),
    };
    let years = match horizon {
        Ok(years) => years,
        Err(message) => {
            debug!("Rejecting horizon: {}", message);
            return Html(render_dashboard(&form, &DashboardBody::Failed(message)));
        }
    };
    let request = PipelineRequest {
        ticker: form.ticker.clone(),
        years,
    };

    let html = match run_pipeline(&state, &request).await {
        Ok(PipelineOutcome::NoData { ticker }) => {
            render_dashboard(&form, &DashboardBody::NoData { ticker: &ticker })
        }
        Ok(PipelineOutcome::Ready(report)) => {
            debug!("Rendering forecast of {} rows", report.table.len());
            render_dashboard(&form, &DashboardBody::Ready(&report))
        }
        Err(PipelineError::InvalidHorizon(years)) => {
            render_dashboard(&form, &DashboardBody::InvalidHorizon(years))
        }
        Err(PipelineError::Forecast { series, source, .. }) => render_dashboard(
            &form,
            &DashboardBody::ForecastFailed {
                series: &series,
                error: source.to_string(),
            },
        ),
        Err(e @ PipelineError::Task(_)) => {
            render_dashboard(&form, &DashboardBody::Failed(e.to_string()))
        }
    };

    Html(html)
}
