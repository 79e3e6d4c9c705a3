// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stateless orchestration surface over the substrate: create/get/list/
//! delete/retry jobs, queue stats, and the agent directory.

use crate::responses::collect_responses;
use crate::status;
use chrono::{DateTime, Utc};
use fleet_core::{
    classify_operation, sanitize_hostname, subject_for_job, AgentRegistration, ClientError, Clock,
    JobEnvelope, JobId, Operation, QueuedJob, ResponseRecord, RouteTarget, StatusEvent,
    SubjectNamespace,
};
use fleet_substrate::SubstrateAdapter;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of `CreateJob`/`RetryJob`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedJob {
    pub job_id: String,
    pub status: String,
    pub revision: u64,
    pub timestamp: String,
}

/// A page of jobs plus the total count before pagination.
#[derive(Debug, Clone)]
pub struct JobPage {
    pub jobs: Vec<QueuedJob>,
    pub total_count: usize,
}

/// Result of `GetQueueStats`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    pub total_jobs: usize,
    pub status_counts: HashMap<String, usize>,
    pub operation_counts: HashMap<String, usize>,
    pub dlq_count: u64,
}

/// Stateless client over a [`SubstrateAdapter`], parameterized by a
/// [`Clock`] so tests can control `now()`.
#[derive(Clone)]
pub struct JobClient<C: Clock> {
    substrate: Arc<dyn SubstrateAdapter>,
    clock: C,
    namespace: SubjectNamespace,
    heartbeat_staleness: Duration,
    nano_seq: Arc<AtomicI64>,
}

async fn with_cancellation<T>(
    token: &CancellationToken,
    fut: impl std::future::Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ClientError::Cancelled),
        result = fut => result,
    }
}

impl<C: Clock> JobClient<C> {
    pub fn new(
        substrate: Arc<dyn SubstrateAdapter>,
        clock: C,
        namespace: SubjectNamespace,
        heartbeat_staleness: Duration,
    ) -> Self {
        Self {
            substrate,
            clock,
            namespace,
            heartbeat_staleness,
            nano_seq: Arc::new(AtomicI64::new(0)),
        }
    }

    fn now_rfc3339(&self) -> String {
        let millis = self.clock.epoch_ms() as i64;
        DateTime::<Utc>::from_timestamp_millis(millis)
            .unwrap_or_else(Utc::now)
            .to_rfc3339()
    }

    fn next_unix_nano(&self) -> i64 {
        let base = self.clock.epoch_ms() as i64 * 1_000_000;
        base + self.nano_seq.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn create_job(
        &self,
        operation: Operation,
        target: &str,
        token: &CancellationToken,
    ) -> Result<CreatedJob, ClientError> {
        with_cancellation(token, self.create_job_inner(operation, target)).await
    }

    async fn create_job_inner(&self, operation: Operation, target: &str) -> Result<CreatedJob, ClientError> {
        if operation.op_type.is_empty() {
            return Err(ClientError::validation("operation.type must be a non-empty string"));
        }

        let route = RouteTarget::parse(target);
        let class = classify_operation(&operation.op_type);
        let subject = subject_for_job(&self.namespace, class, &route);

        let job_id = JobId::new();
        let created = self.now_rfc3339();
        let envelope = JobEnvelope::new(job_id.to_string(), created.clone(), subject.clone(), operation.clone());

        let payload = serde_json::to_vec(&envelope).map_err(|e| ClientError::internal(e.to_string()))?;
        let revision = self
            .substrate
            .kv_put(&format!("jobs.{job_id}"), payload)
            .await?;

        let submitted = StatusEvent {
            job_id: job_id.to_string(),
            event: fleet_core::StatusEventKind::Submitted,
            hostname: fleet_core::API_HOSTNAME.to_string(),
            timestamp: created.clone(),
            unix_nano: self.next_unix_nano(),
            data: Some(fleet_core::StatusEventData {
                error: None,
                target_hostname: Some(target.to_string()),
                operation_type: Some(operation.op_type.clone()),
            }),
        };
        let submitted_key = format!(
            "status.{job_id}.submitted._api.{}",
            submitted.unix_nano
        );
        let submitted_payload = serde_json::to_vec(&submitted).map_err(|e| ClientError::internal(e.to_string()))?;
        self.substrate.kv_put(&submitted_key, submitted_payload).await?;

        self.substrate
            .publish(&subject, job_id.to_string().into_bytes())
            .await?;

        Ok(CreatedJob {
            job_id: job_id.to_string(),
            status: "created".to_string(),
            revision,
            timestamp: created,
        })
    }

    pub async fn get_job_status(&self, id: &str, token: &CancellationToken) -> Result<QueuedJob, ClientError> {
        with_cancellation(token, self.get_job_status_inner(id)).await
    }

    async fn get_job_status_inner(&self, id: &str) -> Result<QueuedJob, ClientError> {
        let envelope = self.load_envelope(id).await?;
        let keys = self.substrate.kv_keys().await?;

        let status_prefix = format!("status.{id}.");
        let mut events = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with(&status_prefix)) {
            let Some(entry) = self.substrate.kv_get(key).await? else {
                continue;
            };
            if let Ok(event) = serde_json::from_slice::<StatusEvent>(&entry.value) {
                events.push(event);
            }
        }
        let derived = status::reduce(&events);

        let responses_prefix = format!("responses.{id}.");
        let mut response_records: Vec<(String, ResponseRecord)> = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with(&responses_prefix)) {
            let Some(entry) = self.substrate.kv_get(key).await? else {
                continue;
            };
            if let Ok(record) = serde_json::from_slice::<ResponseRecord>(&entry.value) {
                response_records.push((key.clone(), record));
            }
        }
        let responses = collect_responses(
            id,
            response_records.iter().map(|(k, r)| (k.as_str(), r)),
        );

        Ok(QueuedJob {
            id: envelope.id,
            status: derived.overall.as_str().to_string(),
            created: envelope.created,
            subject: envelope.subject,
            operation: envelope.operation,
            error: derived.error,
            hostname: derived.hostname,
            updated_at: derived.updated_at.unwrap_or_default(),
            worker_states: derived.worker_states,
            timeline: derived.timeline,
            responses,
        })
    }

    async fn load_envelope(&self, id: &str) -> Result<JobEnvelope, ClientError> {
        let entry = self
            .substrate
            .kv_get(&format!("jobs.{id}"))
            .await?
            .ok_or_else(|| ClientError::not_found(format!("jobs.{id}")))?;
        serde_json::from_slice(&entry.value).map_err(|e| ClientError::internal(e.to_string()))
    }

    pub async fn list_jobs(
        &self,
        status_filter: Option<&str>,
        limit: i64,
        offset: i64,
        token: &CancellationToken,
    ) -> Result<JobPage, ClientError> {
        with_cancellation(token, self.list_jobs_inner(status_filter, limit, offset)).await
    }

    async fn list_jobs_inner(
        &self,
        status_filter: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<JobPage, ClientError> {
        if limit < 0 || offset < 0 {
            return Err(ClientError::validation("limit and offset must be non-negative"));
        }
        if let Some(filter) = status_filter {
            if !filter.is_empty() && !status::KNOWN_STATUSES.contains(&filter) {
                return Err(ClientError::validation(format!("unknown status filter {filter:?}")));
            }
        }

        let keys = self.substrate.kv_keys().await?;
        let mut jobs = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with("jobs.")) {
            let id = key.trim_start_matches("jobs.");
            let job = self.get_job_status_inner(id).await?;
            if status_filter.is_some_and(|f| !f.is_empty() && f != job.status) {
                continue;
            }
            jobs.push(job);
        }

        jobs.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));

        let total_count = jobs.len();
        let start = (offset as usize).min(jobs.len());
        let end = start.saturating_add(limit as usize).min(jobs.len());

        Ok(JobPage {
            jobs: jobs[start..end].to_vec(),
            total_count,
        })
    }

    pub async fn delete_job(&self, id: &str, token: &CancellationToken) -> Result<(), ClientError> {
        with_cancellation(token, self.delete_job_inner(id)).await
    }

    async fn delete_job_inner(&self, id: &str) -> Result<(), ClientError> {
        self.substrate
            .kv_get(&format!("jobs.{id}"))
            .await?
            .ok_or_else(|| ClientError::not_found(format!("jobs.{id}")))?;

        self.substrate.kv_delete(&format!("jobs.{id}")).await?;

        let keys = self.substrate.kv_keys().await?;
        let status_prefix = format!("status.{id}.");
        let responses_prefix = format!("responses.{id}.");
        for key in keys
            .iter()
            .filter(|k| k.starts_with(&status_prefix) || k.starts_with(&responses_prefix))
        {
            if let Err(err) = self.substrate.kv_delete(key).await {
                tracing::warn!(job_id = id, key, error = %err, "partial delete failure");
            }
        }

        Ok(())
    }

    pub async fn retry_job(
        &self,
        id: &str,
        target: &str,
        token: &CancellationToken,
    ) -> Result<CreatedJob, ClientError> {
        with_cancellation(token, self.retry_job_inner(id, target)).await
    }

    async fn retry_job_inner(&self, id: &str, target: &str) -> Result<CreatedJob, ClientError> {
        let envelope = self.load_envelope(id).await?;
        if envelope.operation.op_type.is_empty() {
            return Err(ClientError::NoOperationData(id.to_string()));
        }
        self.create_job_inner(envelope.operation, target).await
    }

    pub async fn get_queue_stats(&self, token: &CancellationToken) -> Result<QueueStats, ClientError> {
        with_cancellation(token, self.get_queue_stats_inner()).await
    }

    async fn get_queue_stats_inner(&self) -> Result<QueueStats, ClientError> {
        let keys = self.substrate.kv_keys().await?;
        let mut stats = QueueStats::default();

        for key in keys.iter().filter(|k| k.starts_with("jobs.")) {
            let id = key.trim_start_matches("jobs.");
            let job = self.get_job_status_inner(id).await?;
            stats.total_jobs += 1;
            *stats.status_counts.entry(job.status.clone()).or_insert(0) += 1;
            *stats
                .operation_counts
                .entry(job.operation.op_type.clone())
                .or_insert(0) += 1;
        }

        let dlq_stream = self.namespace.infra_name("JOBS-DLQ");
        let info = self.substrate.stream_info(&dlq_stream).await.unwrap_or_default();
        stats.dlq_count = info.msg_count;

        Ok(stats)
    }

    pub async fn list_agents(&self, token: &CancellationToken) -> Result<Vec<AgentRegistration>, ClientError> {
        with_cancellation(token, self.list_agents_inner()).await
    }

    async fn list_agents_inner(&self) -> Result<Vec<AgentRegistration>, ClientError> {
        let keys = self.substrate.kv_keys().await?;
        let now = self
            .now_rfc3339()
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now());

        let mut agents = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with("agents.")) {
            let Some(entry) = self.substrate.kv_get(key).await? else {
                continue;
            };
            let Ok(agent) = serde_json::from_slice::<AgentRegistration>(&entry.value) else {
                continue;
            };
            let Ok(registered_at) = agent.registered_at.parse::<DateTime<Utc>>() else {
                continue;
            };
            if now.signed_duration_since(registered_at).to_std().unwrap_or(Duration::MAX)
                <= self.heartbeat_staleness
            {
                agents.push(agent);
            }
        }
        Ok(agents)
    }

    pub async fn get_agent(&self, host: &str, token: &CancellationToken) -> Result<AgentRegistration, ClientError> {
        with_cancellation(token, self.get_agent_inner(host)).await
    }

    async fn get_agent_inner(&self, host: &str) -> Result<AgentRegistration, ClientError> {
        let key = format!("agents.{}", sanitize_hostname(host));
        let entry = self
            .substrate
            .kv_get(&key)
            .await?
            .ok_or_else(|| ClientError::not_found(key.clone()))?;
        serde_json::from_slice(&entry.value).map_err(|e| ClientError::internal(e.to_string()))
    }

    /// Legacy alias: just the hostnames of every live agent.
    pub async fn list_workers(&self, token: &CancellationToken) -> Result<Vec<String>, ClientError> {
        Ok(self
            .list_agents(token)
            .await?
            .into_iter()
            .map(|a| a.hostname)
            .collect())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
