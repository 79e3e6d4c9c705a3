// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fleet_core::StatusEventData;

fn event(
    event: StatusEventKind,
    hostname: &str,
    timestamp: &str,
    unix_nano: i64,
    error: Option<&str>,
) -> StatusEvent {
    StatusEvent {
        job_id: "job-1".to_string(),
        event,
        hostname: hostname.to_string(),
        timestamp: timestamp.to_string(),
        unix_nano,
        data: error.map(|e| StatusEventData {
            error: Some(e.to_string()),
            target_hostname: None,
            operation_type: None,
        }),
    }
}

#[test]
fn only_api_submitted_is_overall_submitted() {
    let events = vec![event(
        StatusEventKind::Submitted,
        API_HOSTNAME,
        "2026-07-27T00:00:00Z",
        1,
        None,
    )];
    let derived = reduce(&events);
    assert_eq!(derived.overall, OverallStatus::Submitted);
    assert!(derived.worker_states.is_empty());
}

#[test]
fn started_event_moves_status_to_processing() {
    let events = vec![
        event(StatusEventKind::Submitted, API_HOSTNAME, "2026-07-27T00:00:00Z", 1, None),
        event(StatusEventKind::Acknowledged, "web_01", "2026-07-27T00:00:01Z", 2, None),
        event(StatusEventKind::Started, "web_01", "2026-07-27T00:00:02Z", 3, None),
    ];
    let derived = reduce(&events);
    assert_eq!(derived.overall, OverallStatus::Processing);
    assert_eq!(derived.worker_states["web_01"].status, "started");
}

#[test]
fn all_hosts_completed_is_overall_completed_with_no_error() {
    let events = vec![
        event(StatusEventKind::Submitted, API_HOSTNAME, "2026-07-27T00:00:00Z", 1, None),
        event(StatusEventKind::Started, "web_01", "2026-07-27T00:00:01Z", 2, None),
        event(StatusEventKind::Completed, "web_01", "2026-07-27T00:00:02Z", 3, None),
    ];
    let derived = reduce(&events);
    assert_eq!(derived.overall, OverallStatus::Completed);
    assert!(derived.error.is_none());
    assert_eq!(derived.hostname.as_deref(), Some("web_01"));
}

#[test]
fn mixed_completed_and_failed_is_partial_failure() {
    let events = vec![
        event(StatusEventKind::Started, "web_01", "2026-07-27T00:00:01Z", 1, None),
        event(StatusEventKind::Completed, "web_01", "2026-07-27T00:00:02Z", 2, None),
        event(StatusEventKind::Started, "web_02", "2026-07-27T00:00:01Z", 3, None),
        event(
            StatusEventKind::Failed,
            "web_02",
            "2026-07-27T00:00:03Z",
            4,
            Some("timed out"),
        ),
    ];
    let derived = reduce(&events);
    assert_eq!(derived.overall, OverallStatus::PartialFailure);
    assert_eq!(derived.worker_states["web_02"].error.as_deref(), Some("timed out"));
}

#[test]
fn all_failed_reports_latest_error_message() {
    let events = vec![
        event(
            StatusEventKind::Failed,
            "web_01",
            "2026-07-27T00:00:02Z",
            1,
            Some("disk full"),
        ),
    ];
    let derived = reduce(&events);
    assert_eq!(derived.overall, OverallStatus::Failed);
    assert_eq!(derived.error.as_deref(), Some("disk full"));
}

#[test]
fn timeline_is_sorted_chronologically_regardless_of_input_order() {
    let events = vec![
        event(StatusEventKind::Started, "web_01", "2026-07-27T00:00:02Z", 2, None),
        event(StatusEventKind::Submitted, API_HOSTNAME, "2026-07-27T00:00:00Z", 1, None),
        event(StatusEventKind::Acknowledged, "web_01", "2026-07-27T00:00:01Z", 3, None),
    ];
    let derived = reduce(&events);
    let timestamps: Vec<&str> = derived.timeline.iter().map(|e| e.timestamp.as_str()).collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted);
}

#[test]
fn reducer_is_permutation_invariant() {
    let forward = vec![
        event(StatusEventKind::Started, "web_01", "2026-07-27T00:00:01Z", 1, None),
        event(StatusEventKind::Completed, "web_01", "2026-07-27T00:00:02Z", 2, None),
    ];
    let mut reversed = forward.clone();
    reversed.reverse();

    assert_eq!(reduce(&forward), reduce(&reversed));
}

#[test]
fn identical_timestamps_are_ordered_by_unix_nano() {
    // A fixed clock (as `tests/specs.rs` uses) emits the same RFC3339
    // string for every event in a job's lifecycle. The reducer must still
    // land on "started", not "acknowledged", regardless of the order the
    // two same-timestamp events are passed in.
    let forward = vec![
        event(StatusEventKind::Acknowledged, "web_01", "2026-07-27T00:00:00Z", 1, None),
        event(StatusEventKind::Started, "web_01", "2026-07-27T00:00:00Z", 2, None),
    ];
    let mut reversed = forward.clone();
    reversed.reverse();

    let derived_forward = reduce(&forward);
    let derived_reversed = reduce(&reversed);

    assert_eq!(derived_forward.worker_states["web_01"].status, "started");
    assert_eq!(derived_forward, derived_reversed);
}

#[test]
fn malformed_timestamp_is_skipped_not_rejected() {
    let mut events = vec![event(
        StatusEventKind::Started,
        "web_01",
        "2026-07-27T00:00:01Z",
        1,
        None,
    )];
    events.push(StatusEvent {
        job_id: "job-1".to_string(),
        event: StatusEventKind::Completed,
        hostname: "web_01".to_string(),
        timestamp: "not-a-timestamp".to_string(),
        unix_nano: 2,
        data: None,
    });

    let derived = reduce(&events);
    assert_eq!(derived.overall, OverallStatus::Processing);
}

#[test]
fn worker_state_duration_is_formatted() {
    let events = vec![
        event(StatusEventKind::Started, "web_01", "2026-07-27T00:00:00Z", 1, None),
        event(StatusEventKind::Completed, "web_01", "2026-07-27T00:00:01.500Z", 2, None),
    ];
    let derived = reduce(&events);
    assert_eq!(derived.worker_states["web_01"].duration.as_deref(), Some("1.5s"));
}

#[yare::parameterized(
    submitted_below_processing = { OverallStatus::Processing, OverallStatus::Submitted, true },
    processing_not_above_completed = { OverallStatus::Processing, OverallStatus::Completed, false },
    completed_at_least_completed = { OverallStatus::Completed, OverallStatus::Completed, true },
)]
fn status_ordering_is_monotonic(advanced: OverallStatus, baseline: OverallStatus, expected: bool) {
    assert_eq!(advanced.at_least(&baseline), expected);
}
