// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl agent` - the fleet-wide agent directory.

use clap::{Args, Subcommand};
use fleet_core::SystemClock;
use fleet_engine::JobClient;
use tokio_util::sync::CancellationToken;

use crate::exit_error::ExitError;
use crate::output::{print_value, OutputFormat};

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List agents whose heartbeat is within the staleness window.
    List,
    /// Show one agent's registration.
    Get { hostname: String },
    /// Legacy alias: just the hostnames of every live agent.
    Workers,
}

pub async fn run(
    client: &JobClient<SystemClock>,
    token: &CancellationToken,
    format: OutputFormat,
    args: AgentArgs,
) -> Result<(), ExitError> {
    match args.command {
        AgentCommand::List => {
            let agents = client.list_agents(token).await?;
            print_value(format, &agents, |agents| {
                agents
                    .iter()
                    .map(|a| format!("{} (last heartbeat {})", a.hostname, a.registered_at))
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
        AgentCommand::Get { hostname } => {
            let agent = client.get_agent(&hostname, token).await?;
            print_value(format, &agent, |a| format!("{}: {:?}", a.hostname, a.labels));
        }
        AgentCommand::Workers => {
            let workers = client.list_workers(token).await?;
            print_value(format, &workers, |w| w.join("\n"));
        }
    }
    Ok(())
}
