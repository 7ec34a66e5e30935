pub mod cli;
pub mod core;
pub mod providers;

pub use cli::OutputFormat;

use crate::core::config::AppConfig;
use crate::core::{CancelSignal, CurrencyCode, DateRange, HistorySettings};
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert {
        origin: String,
        destination: String,
        amount: f64,
    },
    History {
        origin: String,
        destination: String,
        start_date: String,
        end_date: String,
    },
    Forecast {
        origin: String,
        destination: String,
    },
    Destinations {
        origin: String,
    },
}

impl AppCommand {
    /// Whether the command fetches a rate series day by day and can be cancelled.
    pub fn walks_series(&self) -> bool {
        matches!(
            self,
            AppCommand::History { .. } | AppCommand::Forecast { .. }
        )
    }
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    info!("fxcast starting...");

    let config = match config_path {
        Some(path) => {
            AppConfig::load_from_path(path)?.with_env_overrides(|name| std::env::var(name).ok())
        }
        None => AppConfig::load()?,
    };
    debug!(history = ?config.history, forecast = ?config.forecast, "Loaded config");

    // Only series walks trap Ctrl-C; other commands keep the default SIGINT exit
    let cancel = CancelSignal::new();
    let ctrl_c = command
        .walks_series()
        .then(|| spawn_ctrl_c_handler(cancel.clone()));

    let result = dispatch(command, &config, cancel, format).await;
    if let Some(handler) = ctrl_c {
        handler.abort();
    }
    result
}

fn spawn_ctrl_c_handler(cancel: CancelSignal) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    })
}

fn parse_pair(origin: &str, destination: &str) -> Result<(CurrencyCode, CurrencyCode)> {
    Ok((CurrencyCode::parse(origin)?, CurrencyCode::parse(destination)?))
}

async fn dispatch(
    command: AppCommand,
    config: &AppConfig,
    cancel: CancelSignal,
    format: OutputFormat,
) -> Result<()> {
    let settings = HistorySettings::from(&config.history);

    match command {
        AppCommand::Convert {
            origin,
            destination,
            amount,
        } => {
            let (origin, destination) = parse_pair(&origin, &destination)?;
            let (base_url, api_key) = config.exchangerate()?;
            let provider =
                providers::exchangerate_api::ExchangeRateApiProvider::new(base_url, api_key);
            cli::convert::run(&provider, &origin, &destination, amount, format).await
        }
        AppCommand::History {
            origin,
            destination,
            start_date,
            end_date,
        } => {
            let (origin, destination) = parse_pair(&origin, &destination)?;
            let range = DateRange::parse(&start_date, &end_date)?;
            let (base_url, access_key) = config.exchangerates()?;
            let source =
                providers::exchangerates_api::ExchangeRatesApiProvider::new(base_url, access_key)?;
            cli::history::run(
                &source,
                settings,
                cancel,
                &origin,
                &destination,
                range,
                format,
            )
            .await
        }
        AppCommand::Forecast {
            origin,
            destination,
        } => {
            let (origin, destination) = parse_pair(&origin, &destination)?;
            let (base_url, access_key) = config.exchangerates()?;
            let source =
                providers::exchangerates_api::ExchangeRatesApiProvider::new(base_url, access_key)?;
            cli::forecast::run(
                &source,
                settings,
                config.forecast.window_days,
                cancel,
                &origin,
                &destination,
                format,
            )
            .await
        }
        AppCommand::Destinations { origin } => {
            cli::destinations::run(&CurrencyCode::parse(&origin)?, format)
        }
    }
}
