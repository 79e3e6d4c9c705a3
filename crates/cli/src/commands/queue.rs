// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl queue stats` - aggregate counts across the whole job table.

use clap::{Args, Subcommand};
use fleet_core::SystemClock;
use fleet_engine::JobClient;
use tokio_util::sync::CancellationToken;

use crate::exit_error::ExitError;
use crate::output::{print_value, OutputFormat};

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// Job counts by status and operation type, plus the DLQ depth.
    Stats,
}

pub async fn run(
    client: &JobClient<SystemClock>,
    token: &CancellationToken,
    format: OutputFormat,
    args: QueueArgs,
) -> Result<(), ExitError> {
    match args.command {
        QueueCommand::Stats => {
            let stats = client.get_queue_stats(token).await?;
            print_value(format, &stats, |s| {
                format!(
                    "{} job(s), {} in the DLQ\n  by status: {:?}\n  by operation: {:?}",
                    s.total_jobs, s.dlq_count, s.status_counts, s.operation_counts
                )
            });
        }
    }
    Ok(())
}
