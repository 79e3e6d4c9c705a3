// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fleet_core::FakeClock;
use fleet_substrate::MemorySubstrate;
use std::time::Duration;

fn make_client() -> JobClient<FakeClock> {
    let substrate: Arc<dyn SubstrateAdapter> = Arc::new(MemorySubstrate::new("test"));
    JobClient::new(
        substrate,
        FakeClock::new(),
        SubjectNamespace::none(),
        Duration::from_secs(90),
    )
}

#[tokio::test]
async fn create_job_defaults_empty_target_to_any() {
    let client = make_client();
    let token = CancellationToken::new();
    let op = Operation::new("node.hostname.get");

    let created = client.create_job(op, "", &token).await.unwrap();
    assert_eq!(created.status, "created");

    let job = client.get_job_status(&created.job_id, &token).await.unwrap();
    assert_eq!(job.subject, "jobs.query._any");
}

#[tokio::test]
async fn create_job_rejects_empty_operation_type() {
    let client = make_client();
    let token = CancellationToken::new();
    let op = Operation::new("");
    let err = client.create_job(op, "_any", &token).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn get_job_status_missing_job_is_not_found() {
    let client = make_client();
    let token = CancellationToken::new();
    let err = client.get_job_status("does-not-exist", &token).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn newly_created_job_is_submitted() {
    let client = make_client();
    let token = CancellationToken::new();
    let op = Operation::new("command.shell.execute");
    let created = client.create_job(op, "web-01", &token).await.unwrap();

    let job = client.get_job_status(&created.job_id, &token).await.unwrap();
    assert_eq!(job.status, "submitted");
}

#[tokio::test]
async fn delete_job_removes_envelope_and_rejects_second_delete() {
    let client = make_client();
    let token = CancellationToken::new();
    let op = Operation::new("node.hostname.get");
    let created = client.create_job(op, "_any", &token).await.unwrap();

    client.delete_job(&created.job_id, &token).await.unwrap();
    let err = client.delete_job(&created.job_id, &token).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn retry_job_creates_new_id_and_keeps_original() {
    let client = make_client();
    let token = CancellationToken::new();
    let op = Operation::new("node.hostname.get");
    let created = client.create_job(op, "_any", &token).await.unwrap();

    let retried = client.retry_job(&created.job_id, "_all", &token).await.unwrap();
    assert_ne!(retried.job_id, created.job_id);

    let original = client.get_job_status(&created.job_id, &token).await.unwrap();
    assert_eq!(original.subject, "jobs.query._any");
}

#[tokio::test]
async fn retry_job_missing_is_not_found() {
    let client = make_client();
    let token = CancellationToken::new();
    let err = client.retry_job("does-not-exist", "_any", &token).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn list_jobs_applies_status_filter_and_pagination() {
    let client = make_client();
    let token = CancellationToken::new();
    for _ in 0..3 {
        client
            .create_job(Operation::new("node.hostname.get"), "_any", &token)
            .await
            .unwrap();
    }

    let page = client.list_jobs(Some("submitted"), 2, 0, &token).await.unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.jobs.len(), 2);

    let page = client.list_jobs(Some("completed"), 10, 0, &token).await.unwrap();
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn list_jobs_rejects_negative_pagination() {
    let client = make_client();
    let token = CancellationToken::new();
    let err = client.list_jobs(None, -1, 0, &token).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn list_jobs_rejects_unknown_status_filter() {
    let client = make_client();
    let token = CancellationToken::new();
    let err = client.list_jobs(Some("bogus"), 10, 0, &token).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn get_queue_stats_counts_jobs_and_operations() {
    let client = make_client();
    let token = CancellationToken::new();
    client
        .create_job(Operation::new("node.hostname.get"), "_any", &token)
        .await
        .unwrap();
    client
        .create_job(Operation::new("command.shell.execute"), "_any", &token)
        .await
        .unwrap();

    let stats = client.get_queue_stats(&token).await.unwrap();
    assert_eq!(stats.total_jobs, 2);
    assert_eq!(stats.status_counts["submitted"], 2);
    assert_eq!(stats.operation_counts["node.hostname.get"], 1);
    assert_eq!(stats.dlq_count, 0);
}

#[tokio::test]
async fn get_agent_missing_is_not_found() {
    let client = make_client();
    let token = CancellationToken::new();
    let err = client.get_agent("web-01", &token).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn cancelled_token_short_circuits_before_any_substrate_call() {
    let client = make_client();
    let token = CancellationToken::new();
    token.cancel();
    let err = client
        .create_job(Operation::new("node.hostname.get"), "_any", &token)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
}
