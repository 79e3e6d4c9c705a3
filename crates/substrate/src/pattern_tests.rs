// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    exact_match = { "jobs.query._any", "jobs.query._any", true },
    star_matches_one_token = { "jobs.*.host.web_01", "jobs.query.host.web_01", true },
    star_does_not_cross_tokens = { "jobs.*.host.web_01", "jobs.query.host.web.01", false },
    tail_wildcard_matches_rest = { "jobs.>", "jobs.query.host.web_01", true },
    tail_wildcard_requires_prefix = { "jobs.>", "status.jobs.query", false },
    mismatched_length_without_wildcard = { "jobs.query", "jobs.query._any", false },
)]
fn matches_subjects(pattern: &str, subject: &str, expected: bool) {
    assert_eq!(subject_matches(pattern, subject), expected);
}
