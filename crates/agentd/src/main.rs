// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet-agentd`: runs the agent side of the job dispatch plane on one
//! host. Thin wiring only — heartbeats, subscriptions, and dispatch all
//! live in [`fleet_engine::AgentRuntime`].

use clap::Parser;
use fleet_core::{FleetConfig, SubjectNamespace, SystemClock, Clock};
use fleet_engine::{
    AgentRuntime, AgentRuntimeConfig, HandlerRegistry, providers::{
        HostnameProvider, LoadAverageProvider, PingProvider, ShellExecuteProvider, UptimeProvider,
    },
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleet-agentd", version, about = "Agent process for the fleet job dispatch plane")]
struct Cli {
    /// Path to a FleetConfig TOML file. Missing file falls back to defaults.
    #[arg(long)]
    config: Option<String>,

    /// Talk to an in-process substrate instead of NATS (local smoke testing).
    #[arg(long)]
    memory: bool,

    /// Override the hostname this agent registers under.
    #[arg(long)]
    hostname: Option<String>,

    /// Agent label, repeatable: --label key=value.
    #[arg(long = "label", value_parser = parse_key_value)]
    label: Vec<(String, String)>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FleetConfig::load(path)?,
        None => FleetConfig::default(),
    };

    let substrate = connect_substrate(&config, cli.memory).await?;

    let mut handlers = HandlerRegistry::new();
    let clock = SystemClock;
    let started_at_ms = clock.epoch_ms();
    handlers.register(
        "node.hostname.get",
        Arc::new(HostnameProvider {
            hostname: fleet_engine::resolve_hostname(cli.hostname.as_deref()),
        }),
    );
    handlers.register(
        "node.uptime.get",
        Arc::new(UptimeProvider { clock, started_at_ms }),
    );
    handlers.register("node.load.get", Arc::new(LoadAverageProvider));
    handlers.register("command.shell.execute", Arc::new(ShellExecuteProvider));
    handlers.register("network.ping.do", Arc::new(PingProvider));

    let labels: HashMap<String, String> = cli.label.into_iter().collect();
    let runtime_config = AgentRuntimeConfig {
        hostname: cli.hostname,
        labels,
        heartbeat_interval: config.heartbeat_interval(),
        handler_timeout: config.handler_timeout(),
        max_concurrent_jobs: config.max_concurrent_jobs,
        ..AgentRuntimeConfig::default()
    };

    let runtime = AgentRuntime::new(
        substrate,
        SystemClock,
        SubjectNamespace::new(config.namespace.clone()),
        handlers,
        runtime_config,
    );

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown_signal.cancel();
    });

    tracing::info!(hostname = runtime.hostname(), "fleet-agentd starting");
    runtime.run(shutdown).await?;
    Ok(())
}

/// Resolves when either SIGINT or (on Unix) SIGTERM is received.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Connects to the substrate described by `config`, or the in-process
/// adapter when `use_memory` is set. Duplicated from `fleetctl`'s wiring
/// rather than shared, since the two binaries have no other code in
/// common worth a dependency edge over.
async fn connect_substrate(
    config: &FleetConfig,
    use_memory: bool,
) -> anyhow::Result<Arc<dyn fleet_substrate::SubstrateAdapter>> {
    if use_memory {
        return Ok(Arc::new(fleet_substrate::MemorySubstrate::new(
            config.namespace.clone(),
        )));
    }

    let nats_config = fleet_substrate::NatsConfig {
        url: config.substrate.url.clone(),
        bucket: if config.namespace.is_empty() {
            "fleet".to_string()
        } else {
            format!("{}-fleet", config.namespace)
        },
        stream: fleet_substrate::StreamConfig {
            name: if config.namespace.is_empty() {
                "JOBS".to_string()
            } else {
                format!("{}-JOBS", config.namespace)
            },
            subjects: vec![if config.namespace.is_empty() {
                "jobs.>".to_string()
            } else {
                format!("{}.jobs.>", config.namespace)
            }],
            max_age: Duration::from_secs(config.stream.max_age_secs),
            max_msgs: config.stream.max_msgs,
            ..Default::default()
        },
    };

    let substrate = fleet_substrate::NatsSubstrate::connect(nats_config).await?;
    Ok(Arc::new(substrate))
}
