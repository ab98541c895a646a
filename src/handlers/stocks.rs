use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::PriceSeries;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::pipeline::{PipelineError, PipelineOutcome, PipelineRequest, run_pipeline};
use crate::schemas::{
    ApiResponse, AppState, ErrorResponse, ForecastQuery, ForecastResponse, MIN_YEARS,
};

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn no_data(ticker: &str) -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            format!("Unable to load data for {}", ticker),
            "NO_DATA",
        )),
    )
}

/// Get the daily price history of a ticker
#[utoipa::path(
    get,
    path = "/api/v1/stocks/{ticker}/history",
    tag = "stocks",
    params(
        ("ticker" = String, Path, description = "Stock ticker, e.g. AAPL or TATAMOTORS.BO"),
    ),
    responses(
        (status = 200, description = "Price history retrieved successfully", body = ApiResponse<PriceSeries>),
        (status = 404, description = "No data for the ticker", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_stock_history(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<PriceSeries>>), HandlerError> {
    trace!("Entering get_stock_history function");

    let Some(series) = state.loader.load_data(&ticker).await else {
        warn!("No price history for {}", ticker);
        return Err(no_data(&ticker));
    };

    debug!("Returning {} price records for {}", series.len(), series.ticker);
    let response = ApiResponse {
        data: PriceSeries::clone(&series),
        message: "Price history retrieved successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Forecast the closing price of a ticker
#[utoipa::path(
    get,
    path = "/api/v1/stocks/{ticker}/forecast",
    tag = "stocks",
    params(
        ("ticker" = String, Path, description = "Stock ticker, e.g. AAPL or TATAMOTORS.BO"),
        ForecastQuery,
    ),
    responses(
        (status = 200, description = "Forecast computed successfully", body = ApiResponse<ForecastResponse>),
        (status = 400, description = "Invalid forecast horizon", body = ErrorResponse),
        (status = 404, description = "No data for the ticker", body = ErrorResponse),
        (status = 422, description = "Prices loaded but no forecast could be fitted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_stock_forecast(
    Path(ticker): Path<String>,
    Valid(Query(query)): Valid<Query<ForecastQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<ForecastResponse>>), HandlerError> {
    trace!("Entering get_stock_forecast function");

    let request = PipelineRequest {
        ticker: ticker.clone(),
        years: query.years.unwrap_or(MIN_YEARS),
    };

    match run_pipeline(&state, &request).await {
        Ok(PipelineOutcome::Ready(report)) => {
            info!(
                "Forecast for {} covers {} rows",
                report.series.ticker,
                report.table.len()
            );
            let report = *report;
            let response = ApiResponse {
                data: ForecastResponse {
                    ticker: report.series.ticker.clone(),
                    horizon_days: report.horizon_days,
                    history_rows: report.training_rows,
                    forecast: report.table,
                    seasonalities: report.seasonalities,
                },
                message: "Forecast computed successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Ok(PipelineOutcome::NoData { ticker }) => Err(no_data(&ticker)),
        Err(e @ PipelineError::InvalidHorizon(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string(), "INVALID_HORIZON")),
        )),
        Err(e @ PipelineError::Forecast { .. }) => {
            warn!("Forecast failed: {}", e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(e.to_string(), "FORECAST_FAILED")),
            ))
        }
        Err(e @ PipelineError::Task(_)) => {
            error!("Forecast task failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string(), "INTERNAL_ERROR")),
            ))
        }
    }
}
