//! Event Publisher

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    time::Duration,
};

use async_trait::async_trait;
use mockall::automock;
use rdkafka::{
    ClientConfig,
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};
use tracing::debug;

use crate::domain::events::errors::PublishError;

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
    pub timeout: Duration,
}

pub struct KafkaEventPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaEventPublisher {
    /// # Errors
    ///
    /// Returns an error if the producer can't be created from `config`.
    pub fn new(config: &KafkaConfig) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", config.timeout.as_millis().to_string())
            .set("acks", "all")
            .create()?;

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            timeout: config.timeout,
        })
    }
}

impl Debug for KafkaEventPublisher {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("KafkaEventPublisher")
            .field("topic", &self.topic)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(self.timeout)).await {
            Ok(_) => {
                debug!(topic = %self.topic, key, "event published");

                Ok(())
            }
            Err((error, _)) => Err(error.into()),
        }
    }
}

#[automock]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one message and waits for the broker acknowledgement.
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), PublishError>;
}
