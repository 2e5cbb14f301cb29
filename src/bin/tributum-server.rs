// ABOUTME: Server binary for the Tributum HTTP API backend
// ABOUTME: Loads settings from the environment, installs logging and tracing, then serves until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tributum Contributors

//! # Tributum Server Binary
//!
//! Reads configuration from environment variables, sets up the tracing pipeline
//! and serves the API until Ctrl-C or SIGTERM.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tributum::{
    config::Settings,
    logging, observability,
    server::{Server, ServerResources},
};

#[derive(Parser)]
#[command(name = "tributum-server")]
#[command(about = "Tributum - HTTP API backend with request correlation and tracing")]
pub struct Args {
    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::from_env()?;
    if let Some(host) = args.host {
        settings.api_host = host;
    }
    if let Some(port) = args.port {
        settings.api_port = port;
    }
    settings.validate()?;

    // Exporter setup may warn before the global subscriber exists
    let telemetry = tracing::subscriber::with_default(
        logging::bootstrap_subscriber(&settings.log),
        || observability::setup_tracing(&settings.observability),
    );
    logging::init(&settings, &telemetry)?;

    info!("Starting {} {}", settings.app_name, settings.app_version);
    settings.log_summary();

    let resources = Arc::new(ServerResources::new(settings)?);
    Server::new(resources, telemetry).run().await
}
