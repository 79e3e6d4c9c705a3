// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Abstract pub/sub + key-value collaborator the engine dispatches
//! through, plus two concrete implementations: [`nats`] (JetStream-backed,
//! for production) and [`memory`] (in-process, for tests).

pub mod memory;
pub mod nats;
pub mod pattern;

pub use memory::MemorySubstrate;
pub use nats::{NatsConfig, NatsSubstrate};

use async_trait::async_trait;
use fleet_core::SubstrateError;

/// One KV read: the stored bytes plus the revision assigned at write time.
#[derive(Debug, Clone)]
pub struct KvEntry {
    pub value: Vec<u8>,
    pub revision: u64,
}

/// Stream/consumer configuration knobs, passed through to the adapter.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub name: String,
    pub subjects: Vec<String>,
    pub storage: StorageType,
    pub replicas: usize,
    pub max_age: std::time::Duration,
    pub max_msgs: i64,
    pub discard: DiscardPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            name: "JOBS".to_string(),
            subjects: vec!["jobs.>".to_string()],
            storage: StorageType::File,
            replicas: 1,
            max_age: std::time::Duration::from_secs(24 * 60 * 60),
            max_msgs: 10_000,
            discard: DiscardPolicy::Old,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    File,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardPolicy {
    Old,
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPolicy {
    Instant,
    Original,
}

/// Consumer configuration for one `subscribe` call.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub max_deliver: i64,
    pub ack_wait: std::time::Duration,
    pub max_ack_pending: i64,
    pub replay_policy: ReplayPolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_deliver: 3,
            ack_wait: std::time::Duration::from_secs(30),
            max_ack_pending: 10,
            replay_policy: ReplayPolicy::Instant,
        }
    }
}

/// Stream-level counters, used by `GetQueueStats`'s DLQ count.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamInfo {
    pub msg_count: u64,
}

/// A message delivered to a subscription, with explicit ack.
#[async_trait]
pub trait DeliveredMessage: Send {
    fn subject(&self) -> &str;
    fn payload(&self) -> &[u8];
    async fn ack(&self) -> Result<(), SubstrateError>;
}

/// A live subscription: pull the next delivered message, or `None` once
/// the subscription is closed.
#[async_trait]
pub trait Subscription: Send {
    async fn next(&mut self) -> Option<Box<dyn DeliveredMessage>>;
}

/// Abstract pub/sub + key-value collaborator. Every substrate call is
/// potentially blocking I/O from the engine's point of view.
#[async_trait]
pub trait SubstrateAdapter: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), SubstrateError>;

    async fn subscribe(
        &self,
        pattern: &str,
        queue_group: Option<&str>,
        consumer: ConsumerConfig,
    ) -> Result<Box<dyn Subscription>, SubstrateError>;

    async fn kv_put(&self, key: &str, payload: Vec<u8>) -> Result<u64, SubstrateError>;

    async fn kv_get(&self, key: &str) -> Result<Option<KvEntry>, SubstrateError>;

    async fn kv_keys(&self) -> Result<Vec<String>, SubstrateError>;

    async fn kv_delete(&self, key: &str) -> Result<(), SubstrateError>;

    fn bucket(&self) -> &str;

    async fn stream_info(&self, name: &str) -> Result<StreamInfo, SubstrateError>;
}
