//! Lesson reminder events published on booking and cancellation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use tutorlink_common::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub lesson_id: String,
    pub slot_id: String,
    pub tutor_id: String,
    pub student_id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// "booked" or "cancelled".
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_link: Option<String>,
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: &ReminderEvent) -> Result<(), DomainError>;
}

/// Kafka sink: acks=1, synchronous send, keyed by lesson id.
pub struct KafkaEventSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaEventSink {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer = rdkafka::ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("acks", "1")
            .set("message.timeout.ms", "5000")
            .create()?;
        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl EventSink for KafkaEventSink {
    async fn send(&self, event: &ReminderEvent) -> Result<(), DomainError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| DomainError::internal(format!("encode reminder event: {e}")))?;

        let record = FutureRecord::to(&self.topic)
            .key(&event.lesson_id)
            .payload(&payload);

        self.producer
            .send(record, Timeout::After(Duration::from_secs(5)))
            .await
            .map_err(|(e, _)| DomainError::internal(format!("send reminder event: {e}")))?;
        Ok(())
    }
}
