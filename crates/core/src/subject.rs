// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subject algebra: pure functions mapping routing intent to pub/sub topic
//! names, and back.
//!
//! Grammar:
//! ```text
//! <subject> ::= [<ns> "."] "jobs" "." <class> "." <route>
//! <class>   ::= "query" | "modify"
//! <route>   ::= "_any" | "_all"
//!             | "host" "." <sanitized-hostname>
//!             | "label" "." <key> "." <value-segments>
//! ```

use crate::target::{sanitize_hostname, RouteTarget};
use std::fmt;

/// Operation class: whether a job subject is published under `query` or
/// `modify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    Query,
    Modify,
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationClass::Query => write!(f, "query"),
            OperationClass::Modify => write!(f, "modify"),
        }
    }
}

/// Classify an operation by its `type` string: query iff the type ends in
/// `.get`/`.query`/`.read`/`.status`/`.do`, or begins with `node.`; modify
/// otherwise.
///
/// NOTE: the `.do` suffix is classified as a query even for operations that
/// mutate state (e.g. `network.ping.do`). This naming quirk is kept as-is,
/// not "fixed" here.
pub fn classify_operation(op_type: &str) -> OperationClass {
    let is_query = op_type.ends_with(".get")
        || op_type.ends_with(".query")
        || op_type.ends_with(".read")
        || op_type.ends_with(".status")
        || op_type.ends_with(".do")
        || op_type.starts_with("node.");
    if is_query {
        OperationClass::Query
    } else {
        OperationClass::Modify
    }
}

/// Process-wide (but never global-static) subject namespace. Constructed
/// once at startup and threaded explicitly into every call site rather
/// than read from a global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectNamespace(String);

impl SubjectNamespace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self(namespace.into())
    }

    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `"jobs"` when empty, `"<namespace>.jobs"` otherwise.
    pub fn jobs_base(&self) -> String {
        if self.0.is_empty() {
            "jobs".to_string()
        } else {
            format!("{}.jobs", self.0)
        }
    }

    /// `"<namespace>-<name>"` (or `<name>` if namespace empty) for stream
    /// and KV bucket names.
    pub fn infra_name(&self, name: &str) -> String {
        if self.0.is_empty() {
            name.to_string()
        } else {
            format!("{}-{}", self.0, name)
        }
    }

    /// `"<namespace>.<subjects>"` for subject filters.
    pub fn subject_filter(&self, subjects: &str) -> String {
        if self.0.is_empty() {
            subjects.to_string()
        } else {
            format!("{}.{}", self.0, subjects)
        }
    }
}

fn route_token(target: &RouteTarget) -> String {
    match target {
        RouteTarget::Any => "_any".to_string(),
        RouteTarget::All => "_all".to_string(),
        RouteTarget::Label { key, value } => format!("label.{key}.{value}"),
        RouteTarget::Host(h) => format!("host.{}", sanitize_hostname(h)),
    }
}

/// The primary subject builder: `"<prefix>.<route>"`.
pub fn subject_from_target(prefix: &str, target: &RouteTarget) -> String {
    format!("{prefix}.{}", route_token(target))
}

/// `"<base>.query.<route>"`.
pub fn build_query_subject(base: &str, target: &RouteTarget) -> String {
    subject_from_target(&format!("{base}.query"), target)
}

/// `"<base>.modify.<route>"`.
pub fn build_modify_subject(base: &str, target: &RouteTarget) -> String {
    subject_from_target(&format!("{base}.modify"), target)
}

/// Build the subject a job should be published on, given the namespace,
/// the operation's class, and its routing target.
pub fn subject_for_job(ns: &SubjectNamespace, class: OperationClass, target: &RouteTarget) -> String {
    let base = ns.jobs_base();
    match class {
        OperationClass::Query => build_query_subject(&base, target),
        OperationClass::Modify => build_modify_subject(&base, target),
    }
}

/// Routing component recovered by [`parse_subject`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRoute {
    Any,
    All,
    Host(String),
    Label { key: String, value: String },
}

/// Error returned when a subject does not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectParseError(pub String);

impl fmt::Display for SubjectParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed subject: {:?}", self.0)
    }
}

impl std::error::Error for SubjectParseError {}

/// Parse a subject back into its `(prefix, class, route)` components.
/// `prefix` is everything up to and including the literal `jobs` token
/// (e.g. `"jobs"` or `"acme.jobs"`); locates the literal `jobs` token, the
/// following token must be the class, and the remainder must match one of
/// the four route forms.
pub fn parse_subject(subject: &str) -> Result<(String, OperationClass, ParsedRoute), SubjectParseError> {
    let tokens: Vec<&str> = subject.split('.').collect();
    let jobs_idx = tokens
        .iter()
        .position(|t| *t == "jobs")
        .ok_or_else(|| SubjectParseError(subject.to_string()))?;

    let prefix = tokens[..=jobs_idx].join(".");
    let rest = &tokens[jobs_idx + 1..];
    if rest.len() < 2 {
        return Err(SubjectParseError(subject.to_string()));
    }

    let class = match rest[0] {
        "query" => OperationClass::Query,
        "modify" => OperationClass::Modify,
        _ => return Err(SubjectParseError(subject.to_string())),
    };

    let route_tokens = &rest[1..];
    let route = match route_tokens {
        ["_any"] => ParsedRoute::Any,
        ["_all"] => ParsedRoute::All,
        ["host", host] => ParsedRoute::Host((*host).to_string()),
        ["label", key, value_segments @ ..] if !value_segments.is_empty() => ParsedRoute::Label {
            key: (*key).to_string(),
            value: value_segments.join("."),
        },
        _ => return Err(SubjectParseError(subject.to_string())),
    };

    Ok((prefix, class, route))
}

/// `"agents.<category>"`, the competing-consumer queue group used for
/// `_any` delivery.
pub fn queue_group(category: &str) -> String {
    format!("agents.{category}")
}

/// The set of subscription patterns an agent with the given hostname and
/// labels should subscribe to, given the namespace's jobs base.
///
/// Always contains the three built-ins (`<base>.*.host.<sanitized>`,
/// `<base>.*._any`, `<base>.*._all`) plus one pattern per dotted-prefix of
/// every label value.
pub fn subscription_patterns(ns: &SubjectNamespace, hostname: &str, labels: &[(String, String)]) -> Vec<String> {
    let base = ns.jobs_base();
    let sanitized = sanitize_hostname(hostname);
    let mut patterns = vec![
        format!("{base}.*.host.{sanitized}"),
        format!("{base}.*._any"),
        format!("{base}.*._all"),
    ];

    for (key, value) in labels {
        let segments: Vec<&str> = value.split('.').collect();
        for i in 1..=segments.len() {
            let prefix = segments[..i].join(".");
            patterns.push(format!("{base}.*.label.{key}.{prefix}"));
        }
    }

    patterns
}

#[cfg(test)]
#[path = "subject_tests.rs"]
mod tests;
