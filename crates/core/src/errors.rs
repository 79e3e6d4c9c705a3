// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Surface-visible error taxonomy.

use thiserror::Error;

/// Errors a substrate adapter implementation may raise. Propagated
/// verbatim into [`ClientError::Substrate`].
#[derive(Debug, Error)]
pub enum SubstrateError {
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("put failed: {0}")]
    Put(String),
    #[error("get failed: {0}")]
    Get(String),
    #[error("keys failed: {0}")]
    Keys(String),
    #[error("delete failed: {0}")]
    Delete(String),
    #[error("subscribe failed: {0}")]
    Subscribe(String),
    #[error("stream info failed: {0}")]
    StreamInfo(String),
    #[error("revision conflict on {key}: expected {expected}, found {found}")]
    RevisionConflict {
        key: String,
        expected: u64,
        found: u64,
    },
}

/// Errors surfaced by the Job Client and Agent Runtime.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no operation data on job {0}")]
    NoOperationData(String),

    #[error(transparent)]
    Substrate(#[from] SubstrateError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ClientError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ClientError::Internal(msg.into())
    }
}

/// Errors an [`crate::providers`]-style operation handler may return.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),
    #[error("handler timed out")]
    Timeout,
    #[error("no handler registered for operation type {0:?}")]
    Unregistered(String),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
