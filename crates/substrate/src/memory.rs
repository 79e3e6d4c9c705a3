// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process substrate: a `HashMap`-backed KV store and an `mpsc`-backed
//! pub/sub bus. Used by the test suite and by single-process demos; not
//! durable across restarts.

use crate::pattern::subject_matches;
use crate::{ConsumerConfig, DeliveredMessage, KvEntry, StreamInfo, Subscription, SubstrateAdapter};
use async_trait::async_trait;
use fleet_core::SubstrateError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

struct Entry {
    payload: Vec<u8>,
    revision: u64,
}

struct SubscriberSlot {
    pattern: String,
    queue_group: Option<String>,
    sender: mpsc::UnboundedSender<(String, Vec<u8>)>,
}

/// Shared state behind every clone of [`MemorySubstrate`].
struct Inner {
    kv: Mutex<HashMap<String, Entry>>,
    subscribers: Mutex<Vec<SubscriberSlot>>,
    revision_counter: AtomicU64,
    bucket: String,
}

/// In-memory [`SubstrateAdapter`]. Cloning shares the same backing store
/// (an `Arc` internally), so publishers and subscribers constructed from
/// clones observe each other.
#[derive(Clone)]
pub struct MemorySubstrate {
    inner: Arc<Inner>,
}

impl MemorySubstrate {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                kv: Mutex::new(HashMap::new()),
                subscribers: Mutex::new(Vec::new()),
                revision_counter: AtomicU64::new(0),
                bucket: bucket.into(),
            }),
        }
    }
}

impl Default for MemorySubstrate {
    fn default() -> Self {
        Self::new("fleet")
    }
}

struct MemoryMessage {
    subject: String,
    payload: Vec<u8>,
}

#[async_trait]
impl DeliveredMessage for MemoryMessage {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn ack(&self) -> Result<(), SubstrateError> {
        // Delivery is fire-and-forget in-process; ack is a no-op, matching
        // "at most once per active subscriber" semantics appropriate to tests.
        Ok(())
    }
}

struct MemorySubscription {
    receiver: mpsc::UnboundedReceiver<(String, Vec<u8>)>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Option<Box<dyn DeliveredMessage>> {
        let (subject, payload) = self.receiver.recv().await?;
        Some(Box::new(MemoryMessage { subject, payload }))
    }
}

#[async_trait]
impl SubstrateAdapter for MemorySubstrate {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), SubstrateError> {
        let mut by_queue_group: HashMap<String, Vec<&SubscriberSlot>> = HashMap::new();
        let subscribers = self.inner.subscribers.lock();
        let mut broadcast_targets = Vec::new();

        for slot in subscribers.iter() {
            if !subject_matches(&slot.pattern, subject) {
                continue;
            }
            match &slot.queue_group {
                Some(group) => by_queue_group.entry(group.clone()).or_default().push(slot),
                None => broadcast_targets.push(slot),
            }
        }

        for slot in broadcast_targets {
            let _ = slot.sender.send((subject.to_string(), payload.clone()));
        }

        for (_, group) in by_queue_group {
            if let Some(slot) = group.first() {
                let _ = slot.sender.send((subject.to_string(), payload.clone()));
            }
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        pattern: &str,
        queue_group: Option<&str>,
        _consumer: ConsumerConfig,
    ) -> Result<Box<dyn Subscription>, SubstrateError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers.lock().push(SubscriberSlot {
            pattern: pattern.to_string(),
            queue_group: queue_group.map(str::to_string),
            sender: tx,
        });
        Ok(Box::new(MemorySubscription { receiver: rx }))
    }

    async fn kv_put(&self, key: &str, payload: Vec<u8>) -> Result<u64, SubstrateError> {
        let revision = self.inner.revision_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.kv.lock().insert(
            key.to_string(),
            Entry {
                payload,
                revision,
            },
        );
        Ok(revision)
    }

    async fn kv_get(&self, key: &str) -> Result<Option<KvEntry>, SubstrateError> {
        Ok(self.inner.kv.lock().get(key).map(|e| KvEntry {
            value: e.payload.clone(),
            revision: e.revision,
        }))
    }

    async fn kv_keys(&self) -> Result<Vec<String>, SubstrateError> {
        Ok(self.inner.kv.lock().keys().cloned().collect())
    }

    async fn kv_delete(&self, key: &str) -> Result<(), SubstrateError> {
        self.inner.kv.lock().remove(key);
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.inner.bucket
    }

    async fn stream_info(&self, _name: &str) -> Result<StreamInfo, SubstrateError> {
        Ok(StreamInfo { msg_count: 0 })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
