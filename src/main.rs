mod config;
mod constants;
mod db;
mod error;
mod handlers;
mod models;
mod predictor;
mod server;
mod storage;
mod utils;

use tracing_subscriber::EnvFilter;

use crate::constants::DEFAULT_LOG_FILTER;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(err) = server::run().await {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}
