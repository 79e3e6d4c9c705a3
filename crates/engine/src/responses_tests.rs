// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn record(status: &str, hostname: &str) -> ResponseRecord {
    ResponseRecord {
        status: status.to_string(),
        hostname: hostname.to_string(),
        data: None,
        error: None,
    }
}

#[test]
fn keeps_highest_unix_nano_per_host_on_collision() {
    let old = record("completed", "web_01");
    let new = record("failed", "web_01");
    let entries = vec![
        ("responses.job-1.web_01.100", &old),
        ("responses.job-1.web_01.200", &new),
    ];

    let responses = collect_responses("job-1", entries);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses["web_01"].status, "failed");
}

#[test]
fn order_of_keys_does_not_affect_winner() {
    let old = record("completed", "web_01");
    let new = record("failed", "web_01");
    let entries = vec![
        ("responses.job-1.web_01.200", &new),
        ("responses.job-1.web_01.100", &old),
    ];

    let responses = collect_responses("job-1", entries);
    assert_eq!(responses["web_01"].status, "failed");
}

#[test]
fn ignores_keys_for_other_jobs() {
    let rec = record("completed", "web_01");
    let entries = vec![("responses.job-2.web_01.100", &rec)];
    let responses = collect_responses("job-1", entries);
    assert!(responses.is_empty());
}

#[test]
fn distinct_hosts_each_keep_their_own_record() {
    let a = record("completed", "web_01");
    let b = record("completed", "web_02");
    let entries = vec![
        ("responses.job-1.web_01.100", &a),
        ("responses.job-1.web_02.150", &b),
    ];
    let responses = collect_responses("job-1", entries);
    assert_eq!(responses.len(), 2);
}
