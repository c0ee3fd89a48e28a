mod config;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use tracker::TrackerClient;

const METRICS_PREFIX: &str = "callsync";

#[derive(Parser)]
#[command(about = "Sync call events to a work-item tracking board")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, short, default_value = "callsync.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the HTTP intake service
    Intake,
    /// Print the columns of the configured board
    Columns,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not set up metrics: {0}")]
    Metrics(String),
    #[error(transparent)]
    Intake(#[from] intake::errors::IntakeError),
    #[error(transparent)]
    Tracker(#[from] tracker::TrackerError),
    #[error("tracker api key and board id are required")]
    MissingTrackerSettings,
    #[error("could not print board: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };
    config.apply_env(|key| std::env::var(key).ok());

    let _sentry = init_logging(config.logging.as_ref());

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting");
            ExitCode::FAILURE
        }
    }
}

fn run(command: CliCommand, config: Config) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match command {
        CliCommand::Intake => {
            if let Some(metrics) = &config.metrics {
                init_metrics(metrics)?;
            }
            tracing::info!("Starting intake");
            runtime.block_on(intake::run(config.intake))?;
        }
        CliCommand::Columns => {
            runtime.block_on(print_columns(&config.intake))?;
        }
    }
    Ok(())
}

async fn print_columns(config: &intake::config::Config) -> Result<(), CliError> {
    let (Some(client), Some(board_id)) = (config.tracker.client(), config.tracker.board_id())
    else {
        return Err(CliError::MissingTrackerSettings);
    };

    let board = client?.list_columns(board_id).await?;
    println!("{}", serde_json::to_string_pretty(&board)?);
    Ok(())
}

fn init_logging(logging: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let sentry = logging.map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(sentry.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    sentry
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;

    shared::metrics_defs::describe_all(intake::metrics_defs::ALL_METRICS);
    shared::metrics_defs::describe_all(tracker::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Metrics enabled"
    );
    Ok(())
}
