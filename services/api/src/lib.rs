mod cli;
mod fetch;
mod infra;
mod routes;
mod server;

use market_pulse::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
