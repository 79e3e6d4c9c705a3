// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::providers::{HandlerRegistry, HostnameProvider};
use fleet_core::{FakeClock, JobId, Operation, SubjectNamespace};
use fleet_substrate::MemorySubstrate;
use std::time::Duration;

#[test]
fn resolve_hostname_prefers_the_configured_value() {
    assert_eq!(resolve_hostname(Some("configured-host")), "configured-host");
}

#[test]
fn resolve_hostname_falls_back_to_os_hostname_when_unset() {
    // Whatever the OS reports (or "unknown" if it can't), the result is
    // never empty.
    assert!(!resolve_hostname(None).is_empty());
    assert!(!resolve_hostname(Some("")).is_empty());
}

fn make_runtime() -> (AgentRuntime<FakeClock>, Arc<dyn SubstrateAdapter>) {
    let substrate: Arc<dyn SubstrateAdapter> = Arc::new(MemorySubstrate::new("test"));
    let mut handlers = HandlerRegistry::new();
    handlers.register(
        "node.hostname.get",
        Arc::new(HostnameProvider {
            hostname: "web-01".to_string(),
        }),
    );

    let config = AgentRuntimeConfig {
        hostname: Some("web-01".to_string()),
        labels: HashMap::new(),
        heartbeat_interval: Duration::from_millis(20),
        handler_timeout: Duration::from_secs(1),
        max_concurrent_jobs: 2,
        agent_version: "0.1.0-test".to_string(),
    };

    let runtime = AgentRuntime::new(
        substrate.clone(),
        FakeClock::new(),
        SubjectNamespace::none(),
        handlers,
        config,
    );
    (runtime, substrate)
}

#[tokio::test]
async fn write_registration_persists_agent_entry() {
    let (runtime, substrate) = make_runtime();
    runtime.write_registration().await.unwrap();

    let entry = substrate.kv_get("agents.web_01").await.unwrap();
    assert!(entry.is_some());
}

#[tokio::test]
async fn process_delivery_completes_a_known_operation() {
    let (runtime, substrate) = make_runtime();
    let job_id = JobId::new();
    let envelope = fleet_core::JobEnvelope::new(
        job_id.to_string(),
        "2026-07-27T00:00:00Z".to_string(),
        "jobs.query.host.web_01".to_string(),
        Operation::new("node.hostname.get"),
    );
    substrate
        .kv_put(
            &format!("jobs.{job_id}"),
            serde_json::to_vec(&envelope).unwrap(),
        )
        .await
        .unwrap();

    struct RealFakeMessage {
        payload: Vec<u8>,
    }
    #[async_trait::async_trait]
    impl fleet_substrate::DeliveredMessage for RealFakeMessage {
        fn subject(&self) -> &str {
            "jobs.query.host.web_01"
        }
        fn payload(&self) -> &[u8] {
            &self.payload
        }
        async fn ack(&self) -> Result<(), fleet_core::SubstrateError> {
            Ok(())
        }
    }

    let message = RealFakeMessage {
        payload: job_id.to_string().into_bytes(),
    };
    runtime.process_delivery(&message).await;

    let keys = substrate.kv_keys().await.unwrap();
    assert!(keys.iter().any(|k| k.starts_with(&format!("status.{job_id}.completed."))));
    assert!(keys.iter().any(|k| k.starts_with(&format!("responses.{job_id}."))));
}
