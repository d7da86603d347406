//! Status Board Server - Binary Entry Point
//!
//! This is the main entry point for the status-server binary.

use std::process::ExitCode;

use tokio::net::TcpListener;

use status_board::{logging, Config, StatusServer};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    logging::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "status server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = status_board::VERSION, bind = %config.bind, "starting status server");

    let listener = TcpListener::bind(config.bind).await?;
    let server = StatusServer::from_config(config)?;

    server.serve(listener, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}
