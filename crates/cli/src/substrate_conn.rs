// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires a [`FleetConfig`] (plus the `--memory` escape hatch) into a live
//! [`SubstrateAdapter`]. No business logic lives here — just connection
//! setup the engine crate has no opinion about.

use fleet_core::FleetConfig;
use fleet_substrate::{NatsConfig, NatsSubstrate, SubstrateAdapter};
use std::sync::Arc;

/// Connect to the substrate described by `config`, or fall back to the
/// in-process [`fleet_substrate::MemorySubstrate`] when `use_memory` is
/// set (manual testing without a live NATS server).
pub async fn connect(config: &FleetConfig, use_memory: bool) -> anyhow::Result<Arc<dyn SubstrateAdapter>> {
    if use_memory {
        return Ok(Arc::new(fleet_substrate::MemorySubstrate::new(
            config.namespace.clone(),
        )));
    }

    let nats_config = NatsConfig {
        url: config.substrate.url.clone(),
        bucket: if config.namespace.is_empty() {
            "fleet".to_string()
        } else {
            format!("{}-fleet", config.namespace)
        },
        stream: fleet_substrate::StreamConfig {
            name: if config.namespace.is_empty() {
                "JOBS".to_string()
            } else {
                format!("{}-JOBS", config.namespace)
            },
            subjects: vec![if config.namespace.is_empty() {
                "jobs.>".to_string()
            } else {
                format!("{}.jobs.>", config.namespace)
            }],
            max_age: std::time::Duration::from_secs(config.stream.max_age_secs),
            max_msgs: config.stream.max_msgs,
            ..Default::default()
        },
    };

    let substrate = NatsSubstrate::connect(nats_config).await?;
    Ok(Arc::new(substrate))
}
