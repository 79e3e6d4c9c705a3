// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end job lifecycle scenarios, exercising the client and agent
//! runtime together over an in-process substrate.

use fleet_core::{FakeClock, Operation, SubjectNamespace};
use fleet_engine::providers::{HandlerRegistry, HostnameProvider};
use fleet_engine::{AgentRuntime, AgentRuntimeConfig, JobClient};
use fleet_substrate::{MemorySubstrate, SubstrateAdapter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn make_client(substrate: Arc<dyn SubstrateAdapter>) -> JobClient<FakeClock> {
    JobClient::new(
        substrate,
        FakeClock::new(),
        SubjectNamespace::none(),
        Duration::from_secs(90),
    )
}

fn make_agent(substrate: Arc<dyn SubstrateAdapter>, hostname: &str) -> AgentRuntime<FakeClock> {
    let mut handlers = HandlerRegistry::new();
    handlers.register(
        "node.hostname.get",
        Arc::new(HostnameProvider {
            hostname: hostname.to_string(),
        }),
    );

    let config = AgentRuntimeConfig {
        hostname: Some(hostname.to_string()),
        labels: HashMap::new(),
        heartbeat_interval: Duration::from_millis(50),
        handler_timeout: Duration::from_secs(2),
        max_concurrent_jobs: 2,
        agent_version: "0.1.0-test".to_string(),
    };

    AgentRuntime::new(substrate, FakeClock::new(), SubjectNamespace::none(), handlers, config)
}

#[tokio::test]
async fn job_submitted_to_a_direct_host_is_completed_by_that_agent() {
    let substrate: Arc<dyn SubstrateAdapter> = Arc::new(MemorySubstrate::new("fleet-specs"));
    let client = make_client(substrate.clone());
    let agent = make_agent(substrate.clone(), "web-01");

    let runtime_shutdown = CancellationToken::new();
    let runtime_handle = {
        let agent = agent.clone();
        let shutdown = runtime_shutdown.clone();
        tokio::spawn(async move {
            let _ = agent.run(shutdown).await;
        })
    };

    // Give the agent a moment to establish its subscriptions before the
    // client publishes.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let token = CancellationToken::new();
    let created = client
        .create_job(Operation::new("node.hostname.get"), "web-01", &token)
        .await
        .unwrap();

    let job = wait_for_terminal(&client, &created.job_id, &token).await;
    assert_eq!(job.status, "completed");
    assert_eq!(job.responses["web_01"].status, "completed");

    runtime_shutdown.cancel();
    let _ = runtime_handle.await;
}

#[tokio::test]
async fn broadcast_job_is_completed_by_every_subscribed_agent() {
    let substrate: Arc<dyn SubstrateAdapter> = Arc::new(MemorySubstrate::new("fleet-specs"));
    let client = make_client(substrate.clone());
    let agent_a = make_agent(substrate.clone(), "web-01");
    let agent_b = make_agent(substrate.clone(), "web-02");

    let shutdown = CancellationToken::new();
    let handle_a = {
        let agent = agent_a.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = agent.run(shutdown).await;
        })
    };
    let handle_b = {
        let agent = agent_b.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = agent.run(shutdown).await;
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;

    let token = CancellationToken::new();
    let created = client
        .create_job(Operation::new("node.hostname.get"), "_all", &token)
        .await
        .unwrap();

    let job = wait_for(&client, &created.job_id, &token, |job| job.responses.len() >= 2).await;
    assert_eq!(job.status, "completed");

    shutdown.cancel();
    let _ = handle_a.await;
    let _ = handle_b.await;
}

#[tokio::test]
async fn job_for_unregistered_operation_type_reports_failed() {
    let substrate: Arc<dyn SubstrateAdapter> = Arc::new(MemorySubstrate::new("fleet-specs"));
    let client = make_client(substrate.clone());
    let agent = make_agent(substrate.clone(), "web-01");

    let shutdown = CancellationToken::new();
    let handle = {
        let agent = agent.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = agent.run(shutdown).await;
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;

    let token = CancellationToken::new();
    let created = client
        .create_job(Operation::new("unregistered.operation.type"), "web-01", &token)
        .await
        .unwrap();

    let job = wait_for_terminal(&client, &created.job_id, &token).await;
    assert_eq!(job.status, "failed");
    assert!(job.error.is_some());

    shutdown.cancel();
    let _ = handle.await;
}

#[tokio::test]
async fn delete_then_get_reports_not_found() {
    let substrate: Arc<dyn SubstrateAdapter> = Arc::new(MemorySubstrate::new("fleet-specs"));
    let client = make_client(substrate);
    let token = CancellationToken::new();

    let created = client
        .create_job(Operation::new("node.hostname.get"), "_any", &token)
        .await
        .unwrap();

    client.delete_job(&created.job_id, &token).await.unwrap();

    let err = client.get_job_status(&created.job_id, &token).await.unwrap_err();
    assert!(matches!(err, fleet_core::ClientError::NotFound(_)));
}

async fn wait_for_terminal(
    client: &JobClient<FakeClock>,
    job_id: &str,
    token: &CancellationToken,
) -> fleet_core::QueuedJob {
    wait_for(client, job_id, token, |job| {
        matches!(job.status.as_str(), "completed" | "failed" | "partial_failure")
    })
    .await
}

async fn wait_for(
    client: &JobClient<FakeClock>,
    job_id: &str,
    token: &CancellationToken,
    predicate: impl Fn(&fleet_core::QueuedJob) -> bool,
) -> fleet_core::QueuedJob {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let job = client.get_job_status(job_id, token).await.unwrap();
        if predicate(&job) {
            return job;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for job {job_id} to reach the expected state, last seen: {job:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
