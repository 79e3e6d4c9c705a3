// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire and KV-persisted data model: [`JobEnvelope`], [`StatusEvent`],
//! [`ResponseRecord`], [`AgentRegistration`], and the reducer's derived
//! [`QueuedJob`] view.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Event kinds that appear in the append-only status log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEventKind {
    Submitted,
    Acknowledged,
    Started,
    Completed,
    Failed,
}

impl StatusEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusEventKind::Submitted => "submitted",
            StatusEventKind::Acknowledged => "acknowledged",
            StatusEventKind::Started => "started",
            StatusEventKind::Completed => "completed",
            StatusEventKind::Failed => "failed",
        }
    }
}

/// `_api`, the pseudo-hostname stamped on the client-initiated `submitted`
/// event.
pub const API_HOSTNAME: &str = "_api";

/// Free-form status-event payload carried in `data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEventData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
}

/// One entry in the append-only status log. Storage key:
/// `status.<job_id>.<event>.<host>.<unix_nano>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEvent {
    pub job_id: String,
    pub event: StatusEventKind,
    pub hostname: String,
    pub timestamp: String,
    pub unix_nano: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StatusEventData>,
}

/// One `(job, agent)` success/failure payload. Storage key:
/// `responses.<job_id>.<host>.<unix_nano>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseRecord {
    pub status: String,
    pub hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A status-history entry recorded on the immutable envelope at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusHistoryEntry {
    pub status: String,
    pub timestamp: String,
}

/// The free-form operation payload: a required `type` plus arbitrary
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operation {
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(flatten)]
    pub params: serde_json::Map<String, Value>,
}

impl Operation {
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            params: serde_json::Map::new(),
        }
    }
}

/// Immutable, one per job. Storage key: `jobs.<id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobEnvelope {
    pub id: String,
    /// Baseline label, always `"unprocessed"`. Not authoritative — the
    /// reducer derives the current status from the event log.
    pub status: String,
    pub created: String,
    pub subject: String,
    pub operation: Operation,
    pub status_history: Vec<StatusHistoryEntry>,
}

impl JobEnvelope {
    pub const BASELINE_STATUS: &'static str = "unprocessed";

    pub fn new(id: String, created: String, subject: String, operation: Operation) -> Self {
        Self {
            status_history: vec![StatusHistoryEntry {
                status: Self::BASELINE_STATUS.to_string(),
                timestamp: created.clone(),
            }],
            id,
            status: Self::BASELINE_STATUS.to_string(),
            created,
            subject,
            operation,
        }
    }
}

/// Mutable, one per agent. Storage key: `agents.<sanitized-hostname>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRegistration {
    pub hostname: String,
    pub labels: HashMap<String, String>,
    pub registered_at: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    pub load_averages: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_stats: Option<Value>,
    pub agent_version: String,
}

/// Per-agent derived state for one job, folded from the status log.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerState {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// One entry in the merged, chronologically sorted timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEntry {
    pub event: StatusEventKind,
    pub hostname: String,
    pub timestamp: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reducer output: [`JobEnvelope`] fields plus derived status, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedJob {
    pub id: String,
    pub status: String,
    pub created: String,
    pub subject: String,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub updated_at: String,
    pub worker_states: HashMap<String, WorkerState>,
    pub timeline: Vec<TimelineEntry>,
    pub responses: HashMap<String, ResponseRecord>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
