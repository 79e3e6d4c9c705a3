// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UUID-backed identifier types.
//!
//! Every entity identifier in the dispatch plane (`JobId`, `AgentId` where
//! a structured identity is needed) is a real UUID v4, per the wire and KV
//! key grammars: `jobs.<uuid>`, `status.<uuid>.*`.

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Define a newtype wrapper around [`Uuid`] with `new`/`Display`/`FromStr`/
/// serde support.
///
/// ```ignore
/// define_uuid_id! {
///     /// Doc comment for the ID type.
///     pub struct JobId;
/// }
/// ```
#[macro_export]
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub ::uuid::Uuid);

        impl $name {
            /// Generate a new random (v4) ID.
            pub fn new() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Parse an existing UUID string.
            pub fn parse(s: &str) -> Result<Self, $crate::id::IdParseError> {
                ::uuid::Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| $crate::id::IdParseError(s.to_string()))
            }

            pub fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::id::IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(u: ::uuid::Uuid) -> Self {
                Self(u)
            }
        }
    };
}

/// A string failed to parse as a UUID-backed identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError(pub String);

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid id: {:?}", self.0)
    }
}

impl std::error::Error for IdParseError {}

define_uuid_id! {
    /// Unique identifier for a job. Rendered as a bare UUID string, matching
    /// the `jobs.<uuid>` key grammar.
    pub struct JobId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
