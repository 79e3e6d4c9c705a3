// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetctl job` - create, inspect, list, retry, and delete jobs.

use clap::{Args, Subcommand};
use fleet_core::{Operation, SystemClock};
use fleet_engine::JobClient;
use tokio_util::sync::CancellationToken;

use crate::exit_error::ExitError;
use crate::output::{print_value, OutputFormat};
use super::{params_to_json, parse_key_value};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Submit a new job.
    Create {
        /// Operation type, e.g. "node.hostname.get".
        #[arg(long = "type")]
        op_type: String,
        /// Routing target: a hostname, "_any", "_all", or "key:value".
        /// Defaults to "_any" when omitted.
        #[arg(long, default_value = "")]
        target: String,
        /// Operation parameter, repeatable: --param key=value.
        #[arg(long = "param", value_parser = parse_key_value)]
        param: Vec<(String, String)>,
    },
    /// Fetch one job's derived status.
    Get { id: String },
    /// List jobs, optionally filtered by derived status.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Delete a job's envelope, status log, and responses.
    Delete { id: String },
    /// Resubmit a job's operation as a fresh job.
    Retry {
        id: String,
        #[arg(long, default_value = "")]
        target: String,
    },
}

pub async fn run(
    client: &JobClient<SystemClock>,
    token: &CancellationToken,
    format: OutputFormat,
    args: JobArgs,
) -> Result<(), ExitError> {
    match args.command {
        JobCommand::Create { op_type, target, param } => {
            let mut operation = Operation::new(op_type);
            operation.params = params_to_json(param);
            let created = client.create_job(operation, &target, token).await?;
            print_value(format, &created, |c| {
                format!("job {} created (revision {})", c.job_id, c.revision)
            });
        }
        JobCommand::Get { id } => {
            let job = client.get_job_status(&id, token).await?;
            print_value(format, &job, |j| format!("{}: {}", j.id, j.status));
        }
        JobCommand::List { status, limit, offset } => {
            let page = client.list_jobs(status.as_deref(), limit, offset, token).await?;
            print_value(format, &(page.jobs, page.total_count), |(jobs, total)| {
                let mut out = format!("{total} job(s) total\n");
                for job in jobs {
                    out.push_str(&format!("  {} {} {}\n", job.id, job.status, job.operation.op_type));
                }
                out
            });
        }
        JobCommand::Delete { id } => {
            client.delete_job(&id, token).await?;
            println!("job {id} deleted");
        }
        JobCommand::Retry { id, target } => {
            let created = client.retry_job(&id, &target, token).await?;
            print_value(format, &created, |c| {
                format!("job {} created from retry of {id} (revision {})", c.job_id, c.revision)
            });
        }
    }
    Ok(())
}
