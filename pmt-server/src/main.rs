//! `pmt-server` -- in-memory REST backend for the PMT client.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default address 127.0.0.1:8080
//! cargo run --bin pmt-server
//!
//! # Custom address with demo data
//! cargo run --bin pmt-server -- --bind 0.0.0.0:9000 --seed
//!
//! # Or via environment variable
//! PMT_SERVER_ADDR=0.0.0.0:9000 cargo run --bin pmt-server
//! ```

use std::sync::Arc;

use clap::Parser;
use pmt_server::config::{ServerCliArgs, ServerConfig};
use pmt_server::routes;
use pmt_server::store::Database;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting pmt server");

    let db = Arc::new(Database::new());
    if config.seed
        && let Err(e) = db.seed_demo().await
    {
        tracing::error!(error = %e, "failed to load demo data");
        std::process::exit(1);
    }

    match routes::start_server_with_state(&config.bind_addr, db).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "pmt server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
