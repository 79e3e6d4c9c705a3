// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure, idempotent reducer folding a job's status-event log into a
//! derived [`DerivedStatus`].

use chrono::{DateTime, Utc};
use fleet_core::{StatusEvent, StatusEventKind, TimelineEntry, WorkerState, API_HOSTNAME};
use std::collections::HashMap;

/// Every value [`OverallStatus::as_str`] can produce, for validating an
/// operator-supplied `ListJobs` status filter.
pub const KNOWN_STATUSES: [&str; 5] = ["submitted", "processing", "completed", "failed", "partial_failure"];

/// Overall job status as computed from the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverallStatus {
    Submitted,
    Processing,
    Completed,
    Failed,
    PartialFailure,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Submitted => "submitted",
            OverallStatus::Processing => "processing",
            OverallStatus::Completed => "completed",
            OverallStatus::Failed => "failed",
            OverallStatus::PartialFailure => "partial_failure",
        }
    }

    /// Position along the `submitted < processing < terminal` ordering
    /// the reducer's monotonicity guarantee is stated against.
    fn rank(&self) -> u8 {
        match self {
            OverallStatus::Submitted => 0,
            OverallStatus::Processing => 1,
            OverallStatus::Completed | OverallStatus::Failed | OverallStatus::PartialFailure => 2,
        }
    }

    /// Whether `self` is at least as advanced as `other` along that order.
    pub fn at_least(&self, other: &OverallStatus) -> bool {
        self.rank() >= other.rank()
    }
}

/// Full reducer output for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedStatus {
    pub overall: OverallStatus,
    pub error: Option<String>,
    pub hostname: Option<String>,
    pub updated_at: Option<String>,
    pub worker_states: HashMap<String, WorkerState>,
    pub timeline: Vec<TimelineEntry>,
}

fn timeline_message(event: StatusEventKind, hostname: &str) -> String {
    match event {
        StatusEventKind::Submitted => "Job submitted to queue".to_string(),
        StatusEventKind::Acknowledged => format!("Job acknowledged by worker {hostname}"),
        StatusEventKind::Started => format!("Job processing started on {hostname}"),
        StatusEventKind::Completed => format!("Job completed successfully on {hostname}"),
        StatusEventKind::Failed => format!("Job failed on {hostname}"),
    }
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts).ok().map(|dt| dt.with_timezone(&Utc))
}

fn format_duration(start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    let millis = (*end - *start).num_milliseconds().max(0) as u64;
    fleet_core::format_elapsed(std::time::Duration::from_millis(millis))
}

/// Fold a job's status events — already filtered to a single `job_id` and
/// already decoded — into a [`DerivedStatus`]. Malformed timestamps are
/// skipped, not rejected, so one bad event can't sink the whole reduction.
///
/// Ordering key is `(timestamp, unix_nano)`, not `timestamp` alone: two
/// lifecycle events for the same host can share an RFC3339 timestamp (a
/// clock with second or millisecond resolution, or a fixed clock in
/// tests), and `unix_nano` is the only field guaranteed to break that tie
/// in submission order regardless of the order events are listed back in.
pub fn reduce(events: &[StatusEvent]) -> DerivedStatus {
    let mut parsed: Vec<(DateTime<Utc>, &StatusEvent)> = events
        .iter()
        .filter_map(|e| parse_timestamp(&e.timestamp).map(|ts| (ts, e)))
        .collect();
    parsed.sort_by_key(|(ts, e)| (*ts, e.unix_nano));

    let mut timeline = Vec::with_capacity(parsed.len());
    let mut worker_errors: HashMap<String, String> = HashMap::new();
    let mut latest_per_host: HashMap<String, (DateTime<Utc>, i64, &StatusEvent)> = HashMap::new();
    let mut started_per_host: HashMap<String, (DateTime<Utc>, i64)> = HashMap::new();
    let mut ended_per_host: HashMap<String, (DateTime<Utc>, i64)> = HashMap::new();
    let mut updated_at: Option<DateTime<Utc>> = None;

    for (ts, event) in &parsed {
        let order_key = (*ts, event.unix_nano);
        let error = match event.event {
            StatusEventKind::Failed => event.data.as_ref().and_then(|d| d.error.clone()),
            _ => None,
        };
        if let (StatusEventKind::Failed, Some(err)) = (event.event, &error) {
            worker_errors.insert(event.hostname.clone(), err.clone());
        }

        timeline.push(TimelineEntry {
            event: event.event,
            hostname: event.hostname.clone(),
            timestamp: event.timestamp.clone(),
            message: timeline_message(event.event, &event.hostname),
            error,
        });

        if event.hostname != API_HOSTNAME {
            latest_per_host
                .entry(event.hostname.clone())
                .and_modify(|(prev_ts, prev_nano, prev_event)| {
                    if order_key >= (*prev_ts, *prev_nano) {
                        *prev_ts = *ts;
                        *prev_nano = event.unix_nano;
                        *prev_event = event;
                    }
                })
                .or_insert((*ts, event.unix_nano, event));

            match event.event {
                StatusEventKind::Started => {
                    started_per_host
                        .entry(event.hostname.clone())
                        .and_modify(|prev| {
                            if order_key > *prev {
                                *prev = order_key;
                            }
                        })
                        .or_insert(order_key);
                }
                StatusEventKind::Completed | StatusEventKind::Failed => {
                    if let Some(start) = started_per_host.get(&event.hostname) {
                        if order_key >= *start {
                            ended_per_host
                                .entry(event.hostname.clone())
                                .and_modify(|prev| {
                                    if order_key < *prev {
                                        *prev = order_key;
                                    }
                                })
                                .or_insert(order_key);
                        }
                    }
                }
                _ => {}
            }
        }

        updated_at = Some(updated_at.map_or(*ts, |prev| prev.max(*ts)));
    }

    let mut worker_states = HashMap::new();
    for (host, (_, _, event)) in &latest_per_host {
        let start_time = started_per_host.get(host).map(|(ts, _)| ts);
        let end_time = ended_per_host.get(host).map(|(ts, _)| ts);
        let duration = match (start_time, end_time) {
            (Some(s), Some(e)) => Some(format_duration(s, e)),
            _ => None,
        };
        worker_states.insert(
            host.clone(),
            WorkerState {
                status: event.event.as_str().to_string(),
                error: worker_errors.get(host).cloned(),
                start_time: start_time.map(|t| t.to_rfc3339()),
                end_time: end_time.map(|t| t.to_rfc3339()),
                duration,
            },
        );
    }

    let overall = if latest_per_host.is_empty() {
        OverallStatus::Submitted
    } else if latest_per_host
        .values()
        .any(|(_, _, e)| matches!(e.event, StatusEventKind::Started | StatusEventKind::Acknowledged))
    {
        OverallStatus::Processing
    } else {
        let all_completed = latest_per_host
            .values()
            .all(|(_, _, e)| e.event == StatusEventKind::Completed);
        let all_failed = latest_per_host
            .values()
            .all(|(_, _, e)| e.event == StatusEventKind::Failed);
        if all_completed {
            OverallStatus::Completed
        } else if all_failed {
            OverallStatus::Failed
        } else {
            OverallStatus::PartialFailure
        }
    };

    let error = match overall {
        OverallStatus::Failed | OverallStatus::PartialFailure => parsed
            .iter()
            .rev()
            .find_map(|(_, e)| e.data.as_ref().and_then(|d| d.error.clone())),
        _ => None,
    };

    let hostname = parsed
        .iter()
        .rev()
        .find(|(_, e)| matches!(e.event, StatusEventKind::Completed | StatusEventKind::Failed))
        .map(|(_, e)| e.hostname.clone());

    DerivedStatus {
        overall,
        error,
        hostname,
        updated_at: updated_at.map(|t| t.to_rfc3339()),
        worker_states,
        timeline,
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
