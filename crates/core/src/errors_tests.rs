// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn substrate_error_wraps_into_client_error() {
    let err: ClientError = SubstrateError::Get("timeout".to_string()).into();
    match err {
        ClientError::Substrate(SubstrateError::Get(msg)) => assert_eq!(msg, "timeout"),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn display_messages_are_human_readable() {
    assert_eq!(
        ClientError::validation("missing type").to_string(),
        "validation error: missing type"
    );
    assert_eq!(
        ClientError::not_found("jobs.abc").to_string(),
        "not found: jobs.abc"
    );
}
