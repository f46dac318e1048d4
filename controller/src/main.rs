mod config;
mod observability;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tenant_api::TenantApiError;
use tenant_api::manager::MemoryManager;
use tenant_api::reporter::MetricsReporter;

#[derive(Parser)]
#[command(about = "Tenant configuration API of the service mesh controller")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the tenant API and the admin endpoints
    Serve(ConfigArgs),
    /// Check a config file and exit
    ValidateConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Metrics(#[from] observability::MetricsError),
    #[error(transparent)]
    Server(#[from] TenantApiError),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        CliCommand::Serve(args) => serve(args),
        CliCommand::ValidateConfig(args) => Config::from_file(&args.config_file)
            .map(|_| println!("{} is valid", args.config_file.display()))
            .map_err(CliError::from),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn serve(args: ConfigArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_file)?;

    // Sentry must be initialized before the runtime starts
    let _sentry = observability::init_logging(config.logging.as_ref());
    observability::init_metrics(config.metrics.as_ref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    tracing::info!("Starting tenant API");
    runtime.block_on(tenant_api::run(
        config.api,
        Arc::new(MemoryManager::new()),
        Arc::new(MetricsReporter),
    ))?;
    Ok(())
}
