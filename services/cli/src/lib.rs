mod admin;
mod cli;
mod client;
mod demo;
mod infra;

use compta_transport::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
