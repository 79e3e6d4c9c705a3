// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JetStream-backed [`SubstrateAdapter`]: a durable push consumer per
//! subscription, a KV bucket for envelopes/status/responses/agents, and
//! a DLQ stream queried for `GetQueueStats`.

use crate::{
    ConsumerConfig, DeliveredMessage, KvEntry, ReplayPolicy, StorageType, StreamConfig,
    StreamInfo, Subscription, SubstrateAdapter,
};
use async_nats::jetstream::{self, kv::Store};
use async_trait::async_trait;
use fleet_core::SubstrateError;
use futures_util::StreamExt;

/// Connection and bucket/stream naming configuration for [`NatsSubstrate`].
#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub url: String,
    pub bucket: String,
    pub stream: StreamConfig,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            bucket: "fleet".to_string(),
            stream: StreamConfig::default(),
        }
    }
}

/// Production substrate adapter backed by `async-nats` JetStream.
pub struct NatsSubstrate {
    jetstream: jetstream::Context,
    kv: Store,
    bucket: String,
    stream_name: String,
}

impl NatsSubstrate {
    /// Connect, then ensure the configured stream and KV bucket exist.
    pub async fn connect(config: NatsConfig) -> Result<Self, SubstrateError> {
        let client = async_nats::connect(&config.url)
            .await
            .map_err(|e| SubstrateError::Publish(e.to_string()))?;
        let jetstream = jetstream::new(client);

        Self::ensure_stream(&jetstream, &config.stream).await?;

        let kv = match jetstream.get_key_value(&config.bucket).await {
            Ok(store) => store,
            Err(_) => jetstream
                .create_key_value(jetstream::kv::Config {
                    bucket: config.bucket.clone(),
                    ..Default::default()
                })
                .await
                .map_err(|e| SubstrateError::Put(e.to_string()))?,
        };

        Ok(Self {
            jetstream,
            kv,
            bucket: config.bucket,
            stream_name: config.stream.name,
        })
    }

    async fn ensure_stream(
        jetstream: &jetstream::Context,
        config: &StreamConfig,
    ) -> Result<(), SubstrateError> {
        if jetstream.get_stream(&config.name).await.is_ok() {
            return Ok(());
        }

        let storage = match config.storage {
            StorageType::File => jetstream::stream::StorageType::File,
            StorageType::Memory => jetstream::stream::StorageType::Memory,
        };
        let discard = match config.discard {
            crate::DiscardPolicy::Old => jetstream::stream::DiscardPolicy::Old,
            crate::DiscardPolicy::New => jetstream::stream::DiscardPolicy::New,
        };

        jetstream
            .create_stream(jetstream::stream::Config {
                name: config.name.clone(),
                subjects: config.subjects.clone(),
                max_age: config.max_age,
                max_messages: config.max_msgs,
                storage,
                discard,
                num_replicas: config.replicas,
                ..Default::default()
            })
            .await
            .map_err(|e| SubstrateError::Publish(e.to_string()))?;

        Ok(())
    }
}

struct NatsMessage {
    subject: String,
    payload: Vec<u8>,
    message: async_nats::jetstream::Message,
}

#[async_trait]
impl DeliveredMessage for NatsMessage {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn ack(&self) -> Result<(), SubstrateError> {
        self.message
            .ack()
            .await
            .map_err(|e| SubstrateError::Publish(e.to_string()))
    }
}

struct NatsSubscription {
    messages: jetstream::consumer::pull::Stream,
}

#[async_trait]
impl Subscription for NatsSubscription {
    async fn next(&mut self) -> Option<Box<dyn DeliveredMessage>> {
        let message = self.messages.next().await?.ok()?;
        let subject = message.subject.to_string();
        let payload = message.payload.to_vec();
        Some(Box::new(NatsMessage {
            subject,
            payload,
            message,
        }))
    }
}

#[async_trait]
impl SubstrateAdapter for NatsSubstrate {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), SubstrateError> {
        tracing::debug!(subject, payload_len = payload.len(), "publishing message");
        self.jetstream
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| SubstrateError::Publish(e.to_string()))?
            .await
            .map_err(|e| SubstrateError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(
        &self,
        pattern: &str,
        queue_group: Option<&str>,
        consumer: ConsumerConfig,
    ) -> Result<Box<dyn Subscription>, SubstrateError> {
        tracing::debug!(pattern, queue_group = ?queue_group, stream = self.stream_name.as_str(), "subscribing");
        let stream = self
            .jetstream
            .get_stream(&self.stream_name)
            .await
            .map_err(|e| SubstrateError::Subscribe(e.to_string()))?;

        let replay_policy = match consumer.replay_policy {
            ReplayPolicy::Instant => jetstream::consumer::ReplayPolicy::Instant,
            ReplayPolicy::Original => jetstream::consumer::ReplayPolicy::Original,
        };

        let durable_name = queue_group.map(|g| format!("{g}-{}", pattern.replace(['.', '*', '>'], "_")));

        let consumer_config = jetstream::consumer::pull::Config {
            durable_name,
            deliver_policy: jetstream::consumer::DeliverPolicy::All,
            ack_policy: jetstream::consumer::AckPolicy::Explicit,
            max_deliver: consumer.max_deliver,
            ack_wait: consumer.ack_wait,
            max_ack_pending: consumer.max_ack_pending,
            replay_policy,
            filter_subject: pattern.to_string(),
            ..Default::default()
        };

        let nats_consumer = stream
            .create_consumer(consumer_config)
            .await
            .map_err(|e| SubstrateError::Subscribe(e.to_string()))?;

        let messages = nats_consumer
            .messages()
            .await
            .map_err(|e| SubstrateError::Subscribe(e.to_string()))?;

        Ok(Box::new(NatsSubscription { messages }))
    }

    async fn kv_put(&self, key: &str, payload: Vec<u8>) -> Result<u64, SubstrateError> {
        tracing::debug!(key, bucket = self.bucket.as_str(), "kv put");
        self.kv
            .put(key, payload.into())
            .await
            .map_err(|e| SubstrateError::Put(e.to_string()))
    }

    async fn kv_get(&self, key: &str) -> Result<Option<KvEntry>, SubstrateError> {
        let entry = self
            .kv
            .entry(key)
            .await
            .map_err(|e| SubstrateError::Get(e.to_string()))?;
        Ok(entry.map(|e| KvEntry {
            value: e.value.to_vec(),
            revision: e.revision,
        }))
    }

    async fn kv_keys(&self) -> Result<Vec<String>, SubstrateError> {
        let mut keys = self
            .kv
            .keys()
            .await
            .map_err(|e| SubstrateError::Keys(e.to_string()))?;
        let mut collected = Vec::new();
        while let Some(key) = keys.next().await {
            collected.push(key.map_err(|e| SubstrateError::Keys(e.to_string()))?);
        }
        Ok(collected)
    }

    async fn kv_delete(&self, key: &str) -> Result<(), SubstrateError> {
        self.kv
            .delete(key)
            .await
            .map_err(|e| SubstrateError::Delete(e.to_string()))
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn stream_info(&self, name: &str) -> Result<StreamInfo, SubstrateError> {
        match self.jetstream.get_stream(name).await {
            Ok(mut stream) => {
                let info = stream
                    .info()
                    .await
                    .map_err(|e| SubstrateError::StreamInfo(e.to_string()))?;
                Ok(StreamInfo {
                    msg_count: info.state.messages,
                })
            }
            Err(_) => Ok(StreamInfo { msg_count: 0 }),
        }
    }
}
