use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use commands::{forecast, serve};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "stockcast")]
#[command(about = "Stock price dashboard with closing price forecasts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080).
        /// Overrides STOCKCAST_BIND_ADDRESS.
        #[arg(short, long)]
        bind_address: Option<String>,
    },
    /// Run the pipeline once and print the raw and forecast tails
    Forecast {
        /// Stock ticker, e.g. AAPL or TATAMOTORS.BO
        #[arg(short, long, default_value = "AAPL")]
        ticker: String,

        /// Forecast horizon in years
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=4))]
        years: u32,
    },
}

impl Cli {
    pub async fn run(self, config: AppConfig) -> Result<()> {
        match self.command {
            Commands::Serve { bind_address } => {
                let bind_address = bind_address.unwrap_or_else(|| config.bind_address.clone());
                serve(&config, &bind_address).await?;
            }
            Commands::Forecast { ticker, years } => {
                forecast(&config, &ticker, years).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forecast() {
        let cli = Cli::try_parse_from(["stockcast", "forecast", "--ticker", "MSFT", "--years", "3"])
            .unwrap();
        match cli.command {
            Commands::Forecast { ticker, years } => {
                assert_eq!(ticker, "MSFT");
                assert_eq!(years, 3);
            }
            _ => panic!("expected forecast command"),
        }
    }

    #[test]
    fn test_years_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["stockcast", "forecast", "--years", "5"]).is_err());
    }

    #[test]
    fn test_serve_bind_address_is_optional() {
        let cli = Cli::try_parse_from(["stockcast", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { bind_address: None }));
    }
}
