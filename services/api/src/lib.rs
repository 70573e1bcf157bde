mod assess;
mod cli;
mod infra;
mod routes;
mod server;

use maturity_assessment::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
