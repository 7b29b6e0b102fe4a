//! serverd
//!
//! Loads the config, wires a sample REST API and an empty RPC route set
//! (served as gRPC and, on the bridge port, as grpc-web) into the listener
//! orchestrator, and runs until a signal arrives or a listener exits.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use clap::Parser;

use serverd::config::{self, load_config, ProcessEnv};
use serverd::lifecycle::{self, has_failures, signals::shutdown_signal, Services, Shutdown};
use serverd::observability::logging;

#[derive(Parser)]
#[command(name = "serverd")]
#[command(about = "Runs the API, RPC and health check listeners under one lifecycle", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short = 'f', long = "config", default_value = "/etc/server/config.toml")]
    config: PathBuf,

    /// Print the supported config version and exit
    #[arg(long = "version")]
    show_version: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.show_version {
        println!("{}", config::version());
        return Ok(());
    }

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load config");
            return Err(e.into());
        }
    };
    logging::init(&config.observability.log_level);

    tracing::info!(
        version = config::version(),
        path = %cli.config.display(),
        address = %config.server.address,
        "serverd starting"
    );

    let services = Services {
        api: Some(sample_api()),
        rpc: Some(tonic::service::Routes::default()),
        bridge: None,
    };

    let shutdown = Shutdown::new();
    let mut result = lifecycle::assemble(&config.server, services, Arc::new(ProcessEnv))
        .listen_and_serve(shutdown.clone());

    let errors = tokio::select! {
        signal = shutdown_signal() => {
            tracing::info!(signal, "Signal received, shutting down");
            shutdown.trigger();
            (&mut result).await?
        }
        early = &mut result => early?,
    };

    for e in &errors {
        if e.is_cancelled() {
            tracing::debug!(error = %e, "Run cancelled");
        } else {
            tracing::error!(kind = ?e.kind(), error = %e, "Listener error");
        }
    }

    if has_failures(&errors) {
        tracing::error!(errors = errors.len(), "Shutdown complete with errors");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn sample_api() -> Router {
    Router::new().route("/sample", get(sample))
}

async fn sample() -> &'static str {
    "sample"
}
