mod output;
mod run;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::run::{InputArgs, RunArgs};

#[derive(Debug, Parser)]
#[command(name = "trendhunt-cli")]
#[command(about = "Find trending products and score their virality")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch trending products, analyse them and write JSON lines
    Run(RunArgs),
    /// Validate environment and run input without making network calls
    CheckConfig {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = trendhunt_core::load_app_config()?;

    // Logs go to stderr; stdout may carry the JSON-lines output.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run::run_pipeline(&args, &config).await,
        Commands::CheckConfig { input } => run::check_config(&input, &config),
    }
}
