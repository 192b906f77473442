//! Booking lifecycle events: transactional outbox and its relay to Kafka

pub mod errors;
pub mod models;
mod publisher;
mod relay;
mod repository;

pub use errors::*;
pub use publisher::*;
pub use relay::*;
pub(crate) use repository::PgOutboxRepository;
