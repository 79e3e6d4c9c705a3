// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-core: subject algebra, data model, and error taxonomy for the
//! fleet job dispatch plane.

pub mod macros;

pub mod clock;
pub mod config;
pub mod errors;
pub mod id;
pub mod model;
pub mod subject;
pub mod target;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, FleetConfig, StreamDefaults, SubstrateConfig};
pub use errors::{ClientError, HandlerError, SubstrateError};
pub use id::{IdParseError, JobId};
pub use model::{
    AgentRegistration, JobEnvelope, Operation, QueuedJob, ResponseRecord, StatusEvent,
    StatusEventData, StatusEventKind, StatusHistoryEntry, TimelineEntry, WorkerState,
    API_HOSTNAME,
};
pub use subject::{
    build_modify_subject, build_query_subject, classify_operation, parse_subject, queue_group,
    subject_for_job, subject_from_target, subscription_patterns, OperationClass, ParsedRoute,
    SubjectNamespace, SubjectParseError,
};
pub use target::{sanitize_hostname, RouteTarget};
pub use time_fmt::format_elapsed;
