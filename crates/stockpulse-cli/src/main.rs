mod run;
mod show;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "stockpulse-cli")]
#[command(about = "Stockpulse command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one pipeline pass, persist the snapshot, and optionally notify a
    /// running server.
    Run {
        /// Base URL of a stockpulse server to notify after a successful run.
        #[arg(long, env = "STOCKPULSE_NOTIFY_URL")]
        notify_url: Option<String>,
    },
    /// Print a summary of the currently persisted snapshot.
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = stockpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { notify_url } => run::execute(&config, notify_url).await,
        Commands::Show => show::execute(&config).await,
    }
}
