use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxcast::OutputFormat;
use fxcast::core::FxError;
use fxcast::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Print reports as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxcast::AppCommand {
    fn from(cmd: Commands) -> fxcast::AppCommand {
        match cmd {
            Commands::Convert {
                origin,
                destination,
                amount,
            } => fxcast::AppCommand::Convert {
                origin,
                destination,
                amount,
            },
            Commands::History {
                origin,
                destination,
                start_date,
                end_date,
            } => fxcast::AppCommand::History {
                origin,
                destination,
                start_date,
                end_date,
            },
            Commands::Forecast {
                origin,
                destination,
            } => fxcast::AppCommand::Forecast {
                origin,
                destination,
            },
            Commands::Destinations { origin } => fxcast::AppCommand::Destinations { origin },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount at the current rate
    Convert {
        origin: String,
        destination: String,
        amount: f64,
    },
    /// Display daily rates for a date range of at most 5 days
    History {
        origin: String,
        destination: String,
        /// First day, YYYY-MM-DD
        start_date: String,
        /// Last day, YYYY-MM-DD
        end_date: String,
    },
    /// Forecast tomorrow's rate from the last 5 days
    Forecast { origin: String, destination: String },
    /// List destination currencies available for an origin
    Destinations { origin: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let result = match cli.command {
        Some(Commands::Setup) => fxcast::cli::setup::setup(),
        Some(cmd) => fxcast::run_command(cmd.into(), cli.config_path.as_deref(), format).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        match e.downcast_ref::<FxError>() {
            Some(fx) => {
                tracing::error!(
                    code = fx.code(),
                    status = fx.status_code(),
                    error = %fx,
                    "Command failed"
                );
                if format == OutputFormat::Json {
                    println!("{}", serde_json::to_string_pretty(&fx.report())?);
                }
            }
            None => tracing::error!(error = %e, "Application failed"),
        }
    }
    result
}
