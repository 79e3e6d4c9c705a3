// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-side runtime: heartbeats registration, subscribes per
//! [`subscription_patterns`], and dispatches deliveries to registered
//! [`OperationHandler`]s under a bounded concurrency floor.

use crate::providers::HandlerRegistry;
use chrono::{DateTime, Utc};
use fleet_core::{
    queue_group, sanitize_hostname, subscription_patterns, AgentRegistration, Clock, JobEnvelope,
    StatusEvent, StatusEventData, StatusEventKind, SubjectNamespace,
};
use fleet_substrate::{ConsumerConfig, SubstrateAdapter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Static configuration for one agent process.
#[derive(Debug, Clone)]
pub struct AgentRuntimeConfig {
    /// Overridden hostname; falls back to the OS hostname, then `"unknown"`.
    pub hostname: Option<String>,
    pub labels: HashMap<String, String>,
    pub heartbeat_interval: Duration,
    pub handler_timeout: Duration,
    pub max_concurrent_jobs: usize,
    pub agent_version: String,
}

impl Default for AgentRuntimeConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            labels: HashMap::new(),
            heartbeat_interval: Duration::from_secs(30),
            handler_timeout: Duration::from_secs(30),
            max_concurrent_jobs: 5,
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Resolve the effective hostname: the configured override, else the OS
/// hostname, else the literal `"unknown"`.
pub fn resolve_hostname(configured: Option<&str>) -> String {
    if let Some(h) = configured {
        if !h.is_empty() {
            return h.to_string();
        }
    }
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Drives one agent process: heartbeats, subscribes, dispatches.
#[derive(Clone)]
pub struct AgentRuntime<C: Clock> {
    substrate: Arc<dyn SubstrateAdapter>,
    clock: C,
    namespace: SubjectNamespace,
    handlers: HandlerRegistry,
    config: AgentRuntimeConfig,
    hostname: String,
    nano_seq: Arc<AtomicI64>,
}

impl<C: Clock + 'static> AgentRuntime<C> {
    pub fn new(
        substrate: Arc<dyn SubstrateAdapter>,
        clock: C,
        namespace: SubjectNamespace,
        handlers: HandlerRegistry,
        config: AgentRuntimeConfig,
    ) -> Self {
        let hostname = resolve_hostname(config.hostname.as_deref());
        Self {
            substrate,
            clock,
            namespace,
            handlers,
            config,
            hostname,
            nano_seq: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    fn now_rfc3339(&self) -> String {
        let millis = self.clock.epoch_ms() as i64;
        DateTime::<Utc>::from_timestamp_millis(millis)
            .unwrap_or_else(Utc::now)
            .to_rfc3339()
    }

    fn next_unix_nano(&self) -> i64 {
        self.clock.epoch_ms() as i64 * 1_000_000 + self.nano_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Run the heartbeat loop and the dispatch loop concurrently until
    /// `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), fleet_core::SubstrateError> {
        tokio::select! {
            _ = self.heartbeat_loop(shutdown.clone()) => Ok(()),
            res = self.dispatch_loop(shutdown) => res,
        }
    }

    async fn write_registration(&self) -> Result<(), fleet_core::SubstrateError> {
        let registration = AgentRegistration {
            hostname: self.hostname.clone(),
            labels: self.config.labels.clone(),
            registered_at: self.now_rfc3339(),
            started_at: self.now_rfc3339(),
            os_info: Some(std::env::consts::OS.to_string()),
            uptime: None,
            load_averages: Vec::new(),
            memory_stats: None,
            agent_version: self.config.agent_version.clone(),
        };
        let key = format!("agents.{}", sanitize_hostname(&self.hostname));
        let payload = serde_json::to_vec(&registration).map_err(|e| {
            fleet_core::SubstrateError::Put(format!("encode registration: {e}"))
        })?;
        self.substrate.kv_put(&key, payload).await?;
        Ok(())
    }

    async fn heartbeat_loop(&self, shutdown: CancellationToken) {
        loop {
            if let Err(err) = self.write_registration().await {
                tracing::warn!(hostname = %self.hostname, error = %err, "heartbeat failed");
            }
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.config.heartbeat_interval) => {}
            }
        }
    }

    async fn dispatch_loop(&self, shutdown: CancellationToken) -> Result<(), fleet_core::SubstrateError> {
        let labels: Vec<(String, String)> = self.config.labels.clone().into_iter().collect();
        let patterns = subscription_patterns(&self.namespace, &self.hostname, &labels);
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_jobs.max(1)));

        let mut handles = Vec::new();
        for pattern in patterns {
            let qg = if pattern.ends_with("._any") {
                Some(queue_group("jobs"))
            } else {
                None
            };
            let mut subscription = self
                .substrate
                .subscribe(&pattern, qg.as_deref(), ConsumerConfig::default())
                .await?;

            let runtime = self.clone();
            let semaphore = semaphore.clone();
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let delivery = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        next = subscription.next() => next,
                    };
                    let Some(message) = delivery else { break };

                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let runtime = runtime.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        runtime.process_delivery(message.as_ref()).await;
                    });
                }
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
        Ok(())
    }

    /// Per-message lifecycle: acknowledged → started → handler dispatch →
    /// completed/failed, with an ack only on the success path or a
    /// well-formed handler failure.
    async fn process_delivery(&self, message: &dyn fleet_substrate::DeliveredMessage) {
        let job_id = String::from_utf8_lossy(message.payload()).to_string();

        if self.emit_event(&job_id, StatusEventKind::Acknowledged, None).await.is_err() {
            return;
        }

        let envelope = match self.load_envelope(&job_id).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                let _ = self
                    .emit_event(&job_id, StatusEventKind::Failed, Some("job envelope missing".to_string()))
                    .await;
                let _ = message.ack().await;
                return;
            }
            Err(_) => return,
        };

        if self.emit_event(&job_id, StatusEventKind::Started, None).await.is_err() {
            return;
        }

        let outcome = tokio::time::timeout(
            self.config.handler_timeout,
            self.handlers.dispatch(&envelope.operation),
        )
        .await;

        let (status, data, error) = match outcome {
            Ok(Ok(bytes)) => ("completed", Some(bytes), None),
            Ok(Err(err)) => ("failed", None, Some(err.to_string())),
            Err(_) => ("failed", None, Some("handler timed out".to_string())),
        };

        let response = fleet_core::ResponseRecord {
            status: status.to_string(),
            hostname: self.hostname.clone(),
            data: data.map(|bytes| serde_json::Value::String(String::from_utf8_lossy(&bytes).to_string())),
            error: error.clone(),
        };
        let response_key = format!("responses.{job_id}.{}.{}", sanitize_hostname(&self.hostname), self.next_unix_nano());
        let Ok(payload) = serde_json::to_vec(&response) else { return };
        if self.substrate.kv_put(&response_key, payload).await.is_err() {
            return;
        }

        let final_event = if status == "completed" {
            StatusEventKind::Completed
        } else {
            StatusEventKind::Failed
        };
        if self.emit_event(&job_id, final_event, error).await.is_err() {
            return;
        }

        let _ = message.ack().await;
    }

    async fn load_envelope(&self, job_id: &str) -> Result<Option<JobEnvelope>, fleet_core::SubstrateError> {
        let Some(entry) = self.substrate.kv_get(&format!("jobs.{job_id}")).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_slice(&entry.value).ok())
    }

    async fn emit_event(
        &self,
        job_id: &str,
        kind: StatusEventKind,
        error: Option<String>,
    ) -> Result<(), fleet_core::SubstrateError> {
        let timestamp = self.now_rfc3339();
        let unix_nano = self.next_unix_nano();
        let sanitized_host = sanitize_hostname(&self.hostname);
        let event = StatusEvent {
            job_id: job_id.to_string(),
            event: kind,
            hostname: self.hostname.clone(),
            timestamp,
            unix_nano,
            data: error.map(|e| StatusEventData {
                error: Some(e),
                target_hostname: None,
                operation_type: None,
            }),
        };
        let key = format!(
            "status.{job_id}.{}.{sanitized_host}.{unix_nano}",
            kind.as_str()
        );
        let payload = serde_json::to_vec(&event)
            .map_err(|e| fleet_core::SubstrateError::Put(e.to_string()))?;
        self.substrate.kv_put(&key, payload).await
    }
}

#[cfg(test)]
#[path = "agent_runtime_tests.rs"]
mod tests;
