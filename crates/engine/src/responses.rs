// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response Store: decode `responses.<job>.<host>.<unix_nano>` keys into a
//! per-host map, preferring the highest `unix_nano` suffix on collision —
//! the latest delivery from a given host wins.

use fleet_core::ResponseRecord;
use std::collections::HashMap;

/// Parse the `unix_nano` suffix and host segment out of a
/// `responses.<job_id>.<host>.<unix_nano>` key.
fn parse_response_key<'a>(key: &'a str, job_id: &str) -> Option<(&'a str, i64)> {
    let prefix = format!("responses.{job_id}.");
    let rest = key.strip_prefix(&prefix)?;
    let (host, nano_str) = rest.rsplit_once('.')?;
    let nano: i64 = nano_str.parse().ok()?;
    Some((host, nano))
}

/// Build the per-host response map for `job_id` from a full `(key, value)`
/// listing. Keys not matching the `responses.<job_id>.` prefix are ignored.
/// When more than one record exists for a host, the one with the highest
/// `unix_nano` suffix wins.
pub fn collect_responses<'a>(
    job_id: &str,
    entries: impl IntoIterator<Item = (&'a str, &'a ResponseRecord)>,
) -> HashMap<String, ResponseRecord> {
    let mut best: HashMap<String, (i64, &ResponseRecord)> = HashMap::new();

    for (key, record) in entries {
        let Some((host, nano)) = parse_response_key(key, job_id) else {
            continue;
        };
        best.entry(host.to_string())
            .and_modify(|(prev_nano, prev_record)| {
                if nano > *prev_nano {
                    *prev_nano = nano;
                    *prev_record = record;
                }
            })
            .or_insert((nano, record));
    }

    best.into_iter()
        .map(|(host, (_, record))| (host, record.clone()))
        .collect()
}

#[cfg(test)]
#[path = "responses_tests.rs"]
mod tests;
