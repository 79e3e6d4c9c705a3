// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl`: a thin operator client over the fleet job dispatch plane.
//! No business logic lives here beyond argument parsing and wiring —
//! every operation is a direct call into [`fleet_engine::JobClient`].

mod commands;
mod exit_error;
mod output;
mod substrate_conn;

use clap::{Parser, Subcommand};
use commands::{agent::AgentArgs, job::JobArgs, queue::QueueArgs};
use exit_error::ExitError;
use fleet_core::{FleetConfig, SubjectNamespace, SystemClock};
use fleet_engine::JobClient;
use output::OutputFormat;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleetctl", version, about = "Operator client for the fleet job dispatch plane")]
struct Cli {
    /// Path to a FleetConfig TOML file. Missing file falls back to defaults.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Talk to an in-process substrate instead of NATS (manual testing).
    #[arg(long, global = true)]
    memory: bool,

    /// Output rendering.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create, inspect, list, retry, and delete jobs.
    Job(JobArgs),
    /// Queue-wide aggregate counts.
    Queue(QueueArgs),
    /// The fleet agent directory.
    Agent(AgentArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(err.code);
    }
}

async fn run() -> Result<(), ExitError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FleetConfig::load(path).map_err(|e| ExitError::new(1, e.to_string()))?,
        None => FleetConfig::default(),
    };

    let substrate = substrate_conn::connect(&config, cli.memory)
        .await
        .map_err(|e| ExitError::new(1, e.to_string()))?;

    let client = JobClient::new(
        substrate,
        SystemClock,
        SubjectNamespace::new(config.namespace.clone()),
        Duration::from_secs(config.heartbeat_staleness_secs),
    );
    let token = CancellationToken::new();

    match cli.command {
        Command::Job(args) => commands::job::run(&client, &token, cli.format, args).await,
        Command::Queue(args) => commands::queue::run(&client, &token, cli.format, args).await,
        Command::Agent(args) => commands::agent::run(&client, &token, cli.format, args).await,
    }
}
