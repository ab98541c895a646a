#[cfg(test)]
mod integration_tests {
    use crate::schemas::{ApiResponse, ErrorResponse, ForecastResponse, HealthResponse};
    use crate::test_utils::test_utils::{
        init_test_tracing, setup_test_app, setup_test_app_state_with_source,
        setup_test_app_with_state, test_price_source, test_today,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::Duration;
    use common::{PriceRecord, PriceSeries};
    use market::FixturePriceSource;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_check() {
        let _guard = init_test_tracing();
        let server = TestServer::new(setup_test_app()).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.data_source, "fixture");
    }

    #[tokio::test]
    async fn test_dashboard_default_ticker() {
        let _guard = init_test_tracing();
        let server = TestServer::new(setup_test_app()).unwrap();

        let response = server.get("/").await;

        response.assert_status(StatusCode::OK);
        let html = response.text();
        assert!(html.contains("<title>Stock Prediction App</title>"));
        assert!(html.contains("value=\"AAPL\""));
        assert!(html.contains("Data loaded successfully!"));
        assert!(html.contains("Raw Data"));
        assert!(html.contains("time-series-chart"));
        assert!(html.contains("Forecast Data"));
        assert!(html.contains("forecast-chart"));
        assert!(html.contains("Forecast Component"));
        assert!(html.contains("components-chart"));
        assert!(!html.contains("Unable to load data"));
    }

    #[tokio::test]
    async fn test_dashboard_unknown_ticker_shows_error_only() {
        let _guard = init_test_tracing();
        let server = TestServer::new(setup_test_app()).unwrap();

        let response = server
            .get("/")
            .add_query_param("ticker", "NOSUCH")
            .add_query_param("years", 2)
            .await;

        response.assert_status(StatusCode::OK);
        let html = response.text();
        assert!(html.contains(
            "Error: Unable to load data for NOSUCH. Please check the stock symbol."
        ));
        assert!(!html.contains("Data loaded successfully!"));
        assert!(!html.contains("Raw Data"));
        assert!(!html.contains("forecast-chart"));
    }

    #[tokio::test]
    async fn test_dashboard_malformed_years_shows_banner() {
        let _guard = init_test_tracing();
        let source = Arc::new(test_price_source());
        let state = setup_test_app_state_with_source(source.clone());
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let response = server.get("/").add_query_param("years", "abc").await;

        response.assert_status(StatusCode::OK);
        let html = response.text();
        assert!(html.contains("<title>Stock Prediction App</title>"));
        assert!(html.contains("whole number between 1 and 4, got 'abc'"));
        assert!(!html.contains("forecast-chart"));
        assert_eq!(source.calls(), 0);

        // A blank slider value falls back to one year.
        let response = server.get("/").add_query_param("years", "").await;
        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("forecast-chart"));
    }

    #[tokio::test]
    async fn test_stock_history() {
        let _guard = init_test_tracing();
        let server = TestServer::new(setup_test_app()).unwrap();

        let response = server.get("/api/v1/stocks/msft/history").await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<PriceSeries> = response.json();
        assert!(body.success);
        assert_eq!(body.data.ticker, "MSFT");
        assert!(!body.data.is_empty());
        // The fetch range ends before today.
        assert!(body.data.last_date().unwrap() < test_today());
    }

    #[tokio::test]
    async fn test_stock_history_unknown_ticker() {
        let _guard = init_test_tracing();
        let server = TestServer::new(setup_test_app()).unwrap();

        let response = server.get("/api/v1/stocks/NOSUCH/history").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "NO_DATA");
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_history_is_loaded_once_per_ticker() {
        let _guard = init_test_tracing();
        let source = Arc::new(test_price_source());
        let state = setup_test_app_state_with_source(source.clone());
        let server = TestServer::new(setup_test_app_with_state(state.clone())).unwrap();

        let first: ApiResponse<PriceSeries> = server.get("/api/v1/stocks/AAPL/history").await.json();
        let second: ApiResponse<PriceSeries> = server.get("/api/v1/stocks/aapl/history").await.json();

        assert_eq!(first.data, second.data);
        assert_eq!(source.calls(), 1);
        assert_eq!(state.loader.cached_entries().await, 1);
    }

    #[tokio::test]
    async fn test_stock_forecast() {
        let _guard = init_test_tracing();
        let server = TestServer::new(setup_test_app()).unwrap();

        let history: ApiResponse<PriceSeries> = server.get("/api/v1/stocks/AAPL/history").await.json();
        let response = server
            .get("/api/v1/stocks/AAPL/forecast")
            .add_query_param("years", 3)
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ForecastResponse> = response.json();
        let forecast = body.data;
        assert_eq!(forecast.ticker, "AAPL");
        assert_eq!(forecast.horizon_days, 3 * 365);
        assert_eq!(forecast.history_rows, history.data.len());
        assert_eq!(
            forecast.forecast.len(),
            history.data.len() + forecast.horizon_days
        );

        let last = forecast.forecast.points.last().unwrap();
        assert_eq!(
            last.date,
            history.data.last_date().unwrap() + Duration::days(3 * 365)
        );
        for point in &forecast.forecast.points {
            assert!(point.yhat_lower <= point.yhat_upper);
        }
        let names: Vec<&str> = forecast.seasonalities.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["weekly", "yearly"]);
    }

    #[tokio::test]
    async fn test_stock_forecast_defaults_to_one_year() {
        let _guard = init_test_tracing();
        let server = TestServer::new(setup_test_app()).unwrap();

        let response = server.get("/api/v1/stocks/MSFT/forecast").await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ForecastResponse> = response.json();
        assert_eq!(body.data.horizon_days, 365);
    }

    #[tokio::test]
    async fn test_stock_forecast_rejects_out_of_range_years() {
        let _guard = init_test_tracing();
        let server = TestServer::new(setup_test_app()).unwrap();

        for years in [0, 5] {
            let response = server
                .get("/api/v1/stocks/AAPL/forecast")
                .add_query_param("years", years)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_stock_forecast_unknown_ticker_never_fits() {
        let _guard = init_test_tracing();
        let source = Arc::new(FixturePriceSource::new());
        let state = setup_test_app_state_with_source(source.clone());
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let response = server.get("/api/v1/stocks/NOSUCH/forecast").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "NO_DATA");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_stock_forecast_too_short_history() {
        let _guard = init_test_tracing();
        let series = PriceSeries::new(
            "TINY",
            vec![PriceRecord {
                date: test_today() - Duration::days(1),
                open: 10.0,
                high: 10.5,
                low: 9.5,
                close: 10.2,
                adj_close: 10.2,
                volume: 1_000,
            }],
        );
        let source = Arc::new(FixturePriceSource::new().with_series(series));
        let state = setup_test_app_state_with_source(source);
        let server = TestServer::new(setup_test_app_with_state(state)).unwrap();

        let response = server.get("/api/v1/stocks/TINY/forecast").await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "FORECAST_FAILED");

        // The dashboard keeps the raw data and reports the failure.
        let html = server.get("/").add_query_param("ticker", "TINY").await.text();
        assert!(html.contains("Data loaded successfully!"));
        assert!(html.contains("Raw Data"));
        assert!(html.contains("Insufficient data"));
        assert!(!html.contains("forecast-chart"));
    }
}
