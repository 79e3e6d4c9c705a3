// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<fleet_core::ClientError> for ExitError {
    fn from(err: fleet_core::ClientError) -> Self {
        let code = match &err {
            fleet_core::ClientError::Validation(_) => 2,
            fleet_core::ClientError::NotFound(_) => 3,
            fleet_core::ClientError::NoOperationData(_) => 4,
            fleet_core::ClientError::Cancelled | fleet_core::ClientError::DeadlineExceeded => 5,
            fleet_core::ClientError::Substrate(_) => 6,
            fleet_core::ClientError::Internal(_) => 70,
        };
        ExitError::new(code, err.to_string())
    }
}
