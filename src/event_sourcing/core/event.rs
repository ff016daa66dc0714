use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use anyhow::Result;

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps domain events with the metadata needed to store, order and trace them.
// Generic over the payload type.
//
// ============================================================================

/// Generic Event Envelope - wraps any domain event with metadata
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    /// 1-based position in the aggregate's log
    pub sequence_number: i64,

    pub event_type: String,
    pub event_version: i32,

    pub event_data: E,

    pub causation_id: Option<Uuid>,
    pub correlation_id: Uuid,

    /// Participant or organizer that issued the command
    pub actor_id: Option<Uuid>,

    /// Decision time (the injected `now`), not wall-clock append time
    pub occurred_at: DateTime<Utc>,

    pub metadata: HashMap<String, String>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_data: E,
        correlation_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_version: E::event_version(),
            event_data,
            causation_id: None,
            correlation_id,
            actor_id: None,
            occurred_at,
            metadata: HashMap::new(),
        }
    }

    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_causation(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Implemented by every payload that can be stored in an event log.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    /// Name of the concrete variant, e.g. `"EnrollmentCreated"`
    fn event_type(&self) -> &'static str;

    fn event_version() -> i32 where Self: Sized { 1 }
}

// ============================================================================
// Event Serialization Helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

pub fn deserialize_event<E: for<'de> Deserialize<'de>>(json: &str) -> Result<E> {
    Ok(serde_json::from_str(json)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    enum Ping {
        Sent { note: String },
    }

    impl DomainEvent for Ping {
        fn event_type(&self) -> &'static str {
            match self {
                Ping::Sent { .. } => "PingSent",
            }
        }
    }

    #[test]
    fn test_envelope_takes_type_from_payload() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let at = Utc::now();

        let envelope = EventEnvelope::new(
            aggregate_id,
            1,
            Ping::Sent { note: "hi".to_string() },
            correlation_id,
            at,
        );

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "PingSent");
        assert_eq!(envelope.event_version, 1);
        assert_eq!(envelope.correlation_id, correlation_id);
        assert_eq!(envelope.occurred_at, at);
        assert!(envelope.actor_id.is_none());
    }

    #[test]
    fn test_envelope_builders() {
        let actor = Uuid::new_v4();
        let cause = Uuid::new_v4();

        let envelope = EventEnvelope::new(
            Uuid::new_v4(),
            3,
            Ping::Sent { note: String::new() },
            Uuid::new_v4(),
            Utc::now(),
        )
        .with_actor(actor)
        .with_causation(cause)
        .with_metadata("source", "test");

        assert_eq!(envelope.actor_id, Some(actor));
        assert_eq!(envelope.causation_id, Some(cause));
        assert_eq!(envelope.metadata.get("source").map(String::as_str), Some("test"));
    }

    #[test]
    fn test_event_json_helpers() {
        let event = Ping::Sent { note: "payload".to_string() };

        let json = serialize_event(&event).unwrap();
        let back: Ping = deserialize_event(&json).unwrap();

        assert_eq!(event, back);
    }
}
