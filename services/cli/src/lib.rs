mod cli;
mod demo;
mod infra;

use placement_core::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
