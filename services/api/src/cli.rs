use crate::fetch::{run_fetch, FetchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use market_pulse::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Market Pulse",
    about = "Serve and query aggregated HouseCanary market data from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one aggregation query and print the merged record as JSON
    Fetch(FetchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured log level/filter
    #[arg(long)]
    pub(crate) log_level: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Fetch(args) => run_fetch(args).await,
    }
}
