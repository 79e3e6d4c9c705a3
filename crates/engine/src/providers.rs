// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation handler contract and the reference providers shipped with
//! the agent runtime.

use async_trait::async_trait;
use fleet_core::{Clock, HandlerError, Operation};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// A pluggable operation implementation. Handlers are looked up by
/// `operation.type` and dispatched by the agent runtime.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn handle(&self, op: &Operation) -> Result<Vec<u8>, HandlerError>;
}

/// Maps `operation.type` strings to their handler.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, op_type: impl Into<String>, handler: Arc<dyn OperationHandler>) {
        self.handlers.insert(op_type.into(), handler);
    }

    pub async fn dispatch(&self, op: &Operation) -> Result<Vec<u8>, HandlerError> {
        let handler = self
            .handlers
            .get(&op.op_type)
            .ok_or_else(|| HandlerError::Unregistered(op.op_type.clone()))?;
        handler.handle(op).await
    }
}

/// `node.hostname.get`: returns the process's resolved hostname.
pub struct HostnameProvider {
    pub hostname: String,
}

#[async_trait]
impl OperationHandler for HostnameProvider {
    async fn handle(&self, _op: &Operation) -> Result<Vec<u8>, HandlerError> {
        Ok(self.hostname.clone().into_bytes())
    }
}

/// `node.uptime.get`: returns elapsed time since the runtime started,
/// sourced from an injected [`Clock`] rather than the OS so tests can
/// control it.
pub struct UptimeProvider<C: Clock> {
    pub clock: C,
    pub started_at_ms: u64,
}

#[async_trait]
impl<C: Clock> OperationHandler for UptimeProvider<C> {
    async fn handle(&self, _op: &Operation) -> Result<Vec<u8>, HandlerError> {
        let elapsed_ms = self.clock.epoch_ms().saturating_sub(self.started_at_ms);
        let elapsed = fleet_core::format_elapsed(std::time::Duration::from_millis(elapsed_ms));
        Ok(elapsed.into_bytes())
    }
}

/// `node.load.get`: 1/5/15-minute load averages. Linux reads
/// `/proc/loadavg`; other platforms report zeros — there is no portable
/// equivalent worth shelling out for.
pub struct LoadAverageProvider;

#[async_trait]
impl OperationHandler for LoadAverageProvider {
    async fn handle(&self, _op: &Operation) -> Result<Vec<u8>, HandlerError> {
        let averages = read_load_averages();
        serde_json::to_vec(&averages).map_err(|e| HandlerError::Failed(e.to_string()))
    }
}

#[cfg(target_os = "linux")]
fn read_load_averages() -> [f64; 3] {
    std::fs::read_to_string("/proc/loadavg")
        .ok()
        .and_then(|contents| {
            let mut fields = contents.split_whitespace();
            let one = fields.next()?.parse().ok()?;
            let five = fields.next()?.parse().ok()?;
            let fifteen = fields.next()?.parse().ok()?;
            Some([one, five, fifteen])
        })
        .unwrap_or([0.0, 0.0, 0.0])
}

#[cfg(not(target_os = "linux"))]
fn read_load_averages() -> [f64; 3] {
    [0.0, 0.0, 0.0]
}

/// `command.shell.execute`: runs `operation.params["command"]` through
/// the platform shell and returns combined stdout.
pub struct ShellExecuteProvider;

#[async_trait]
impl OperationHandler for ShellExecuteProvider {
    async fn handle(&self, op: &Operation) -> Result<Vec<u8>, HandlerError> {
        let command = op
            .params
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| HandlerError::Failed("missing \"command\" parameter".to_string()))?;

        let (shell, flag) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let output = Command::new(shell)
            .arg(flag)
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| HandlerError::Failed(e.to_string()))?;

        if !output.status.success() {
            return Err(HandlerError::Failed(format!(
                "exit status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(output.stdout)
    }
}

/// `network.ping.do`: a TCP-connect reachability probe against
/// `operation.params["address"]`. Named `.do` per the inherited
/// classification quirk (§4.1): it mutates nothing, yet the naming
/// convention files it as a query.
pub struct PingProvider;

#[async_trait]
impl OperationHandler for PingProvider {
    async fn handle(&self, op: &Operation) -> Result<Vec<u8>, HandlerError> {
        let address = op
            .params
            .get("address")
            .and_then(|v| v.as_str())
            .ok_or_else(|| HandlerError::Failed("missing \"address\" parameter".to_string()))?;

        let timeout = std::time::Duration::from_secs(5);
        match tokio::time::timeout(timeout, tokio::net::TcpStream::connect(address)).await {
            Ok(Ok(_)) => Ok(b"reachable".to_vec()),
            Ok(Err(e)) => Err(HandlerError::Failed(e.to_string())),
            Err(_) => Err(HandlerError::Timeout),
        }
    }
}

#[cfg(test)]
#[path = "providers_tests.rs"]
mod tests;
