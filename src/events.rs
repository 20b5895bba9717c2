//! Event Publication
//!
//! Post-commit notification of status changes to downstream consumers
//! (billing, tracking, assignment). At-least-once, fire-and-forget
//! relative to the write: the service logs publish failures and moves on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core_types::LoadId;
use crate::error::PublishError;
use crate::status::LoadStatus;

/// Topic for status change events
pub const LOAD_STATUS_TOPIC: &str = "load.status.changed";

/// Event type carried in the envelope for status changes
pub const LOAD_STATUS_EVENT_TYPE: &str = "load.status.changed";

/// Outbound event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: uuid::Uuid,
    pub event_type: String,
    pub event_time: DateTime<Utc>,
    /// Producer service name, from config
    pub producer: String,
    pub correlation_id: Option<String>,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    pub fn new(event_type: &str, producer: &str, payload: serde_json::Value) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4(),
            event_type: event_type.to_string(),
            event_time: Utc::now(),
            producer: producer.to_string(),
            correlation_id: None,
            payload,
        }
    }

    pub fn with_correlation_id(mut self, cid: Option<String>) -> Self {
        self.correlation_id = cid;
        self
    }
}

/// Payload of a `load.status.changed` event
///
/// Delivery is at-least-once and may duplicate on caller retry;
/// consumers dedupe on `(load_id, new_status, event_time)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadStatusChanged {
    pub load_id: LoadId,
    /// None for the birth event emitted by load creation
    pub previous_status: Option<LoadStatus>,
    pub new_status: LoadStatus,
    pub details: serde_json::Value,
}

/// Outbound notification seam
///
/// Implementations wrap whatever bus the deployment uses. Publish errors
/// are surfaced so the service can log them, but a committed write is
/// never rolled back on account of one.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, envelope: EventEnvelope) -> Result<(), PublishError>;
}

/// Publisher that writes events to the structured log only
///
/// Useful as a default wiring and in environments without a bus.
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, envelope: EventEnvelope) -> Result<(), PublishError> {
        info!(
            topic = topic,
            event_id = %envelope.event_id,
            event_type = %envelope.event_type,
            payload = %envelope.payload,
            "Event published (log only)"
        );
        Ok(())
    }
}

/// In-memory publisher that records every envelope, with an injectable
/// one-shot failure. Used by tests and wiring checks.
#[derive(Default)]
pub struct RecordingPublisher {
    published: tokio::sync::Mutex<Vec<(String, EventEnvelope)>>,
    fail_next: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next publish call fail once
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Snapshot of everything published so far
    pub async fn published(&self) -> Vec<(String, EventEnvelope)> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, envelope: EventEnvelope) -> Result<(), PublishError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PublishError("injected publish failure".to_string()));
        }
        self.published
            .lock()
            .await
            .push((topic.to_string(), envelope));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_fields() {
        let payload = serde_json::json!({"load_id": "x"});
        let env = EventEnvelope::new(LOAD_STATUS_EVENT_TYPE, "loadcore-test", payload.clone())
            .with_correlation_id(Some("req-7".to_string()));

        assert_eq!(env.event_type, LOAD_STATUS_EVENT_TYPE);
        assert_eq!(env.producer, "loadcore-test");
        assert_eq!(env.correlation_id.as_deref(), Some("req-7"));
        assert_eq!(env.payload, payload);
    }

    #[test]
    fn test_status_changed_payload_serializes() {
        let payload = LoadStatusChanged {
            load_id: LoadId::new(),
            previous_status: Some(LoadStatus::Available),
            new_status: LoadStatus::Reserved,
            details: serde_json::json!({"carrier": "ACME"}),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["previous_status"], "available");
        assert_eq!(json["new_status"], "reserved");
    }

    #[tokio::test]
    async fn test_recording_publisher_failure_injection() {
        let publisher = RecordingPublisher::new();
        publisher.fail_next();

        let env = EventEnvelope::new(LOAD_STATUS_EVENT_TYPE, "t", serde_json::Value::Null);
        assert!(
            publisher
                .publish(LOAD_STATUS_TOPIC, env.clone())
                .await
                .is_err()
        );
        // one-shot: next publish succeeds
        assert!(publisher.publish(LOAD_STATUS_TOPIC, env).await.is_ok());
        assert_eq!(publisher.published().await.len(), 1);
    }
}
