use anyhow::{Result, anyhow};
use tracing::{info, trace};

use crate::config::{AppConfig, initialize_app_state};
use crate::helpers::converters::{forecast_tail_frame, price_tail_frame};
use crate::pipeline::{PipelineError, PipelineOutcome, PipelineRequest, run_pipeline};
use crate::render::page::no_data_message;
use crate::render::tables::TAIL_ROWS;

/// Runs the dashboard pipeline once without a server.
pub async fn forecast(config: &AppConfig, ticker: &str, years: u32) -> Result<()> {
    trace!("Entering forecast function");
    let state = initialize_app_state(config)?;
    let request = PipelineRequest {
        ticker: ticker.to_string(),
        years,
    };

    let report = match run_pipeline(&state, &request).await {
        Ok(PipelineOutcome::Ready(report)) => report,
        Ok(PipelineOutcome::NoData { ticker }) => return Err(anyhow!(no_data_message(&ticker))),
        Err(PipelineError::Forecast { series, source, .. }) => {
            println!("Raw Data");
            println!("{}", price_tail_frame(&series, TAIL_ROWS)?);
            return Err(source.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        "Fitted {} rows, forecasting {} days",
        report.training_rows, report.horizon_days
    );
    println!("Data loaded successfully!");
    println!();
    println!("Raw Data");
    println!("{}", price_tail_frame(&report.series, TAIL_ROWS)?);
    println!();
    println!("Forecast Data");
    println!("{}", forecast_tail_frame(&report.forecast, TAIL_ROWS));

    Ok(())
}
