// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod agent;
pub mod job;
pub mod queue;

/// Parse a `key=value` CLI argument into a pair, used by `--param`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

/// Fold repeated `--param key=value` pairs into an operation's parameter
/// map. A value that parses as JSON (a number, bool, `null`, or quoted
/// string) keeps its JSON type; anything else is stored as a plain string.
pub fn params_to_json(pairs: Vec<(String, String)>) -> serde_json::Map<String, serde_json::Value> {
    pairs
        .into_iter()
        .map(|(k, v)| {
            let value = serde_json::from_str(&v).unwrap_or(serde_json::Value::String(v));
            (k, value)
        })
        .collect()
}
