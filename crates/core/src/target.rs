// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routing target: what a job's subject is addressed to.

use std::fmt;

/// What a job should be routed to: a specific host, a load-balanced "any"
/// agent, a broadcast to all agents, or a hierarchical label selector.
///
/// Parses from the operator-facing string forms: `"_any"`, `"_all"`,
/// `"<key>:<value>"` (value may contain `.`), or any other string (treated
/// as a bare hostname).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteTarget {
    Any,
    All,
    Host(String),
    Label { key: String, value: String },
}

impl RouteTarget {
    /// Parse the operator-facing target string. An empty string defaults to
    /// [`RouteTarget::Any`].
    pub fn parse(s: &str) -> Self {
        if s.is_empty() || s == "_any" {
            RouteTarget::Any
        } else if s == "_all" {
            RouteTarget::All
        } else if let Some((key, value)) = s.split_once(':') {
            RouteTarget::Label {
                key: key.to_string(),
                value: value.to_string(),
            }
        } else {
            RouteTarget::Host(s.to_string())
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, RouteTarget::Any)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RouteTarget::All)
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Any => write!(f, "_any"),
            RouteTarget::All => write!(f, "_all"),
            RouteTarget::Host(h) => write!(f, "{h}"),
            RouteTarget::Label { key, value } => write!(f, "{key}:{value}"),
        }
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`. Idempotent:
/// sanitizing an already-sanitized string is a no-op.
pub fn sanitize_hostname(host: &str) -> String {
    host.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
