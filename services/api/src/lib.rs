mod cli;
mod infra;
mod report;
mod routes;
mod server;

use import_duty::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
