//! Event errors.

use rdkafka::error::KafkaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("failed to encode event payload")]
    Encode(#[from] serde_json::Error),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("kafka error")]
    Kafka(#[from] KafkaError),
}
