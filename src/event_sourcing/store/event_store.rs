use std::collections::HashMap;
use uuid::Uuid;
use anyhow::Result;
use tokio::sync::RwLock;

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};

// ============================================================================
// In-Memory Event Store - Repository for Events
// ============================================================================
//
// Generic over the event type.
//
// Responsibilities:
// 1. Append events to a per-aggregate log (append-only)
// 2. Load event history for aggregates
// 3. Optimistic concurrency: every append names the version it was decided
//    against, and is refused if another writer got there first
//
// A whole append happens under one write lock, so a batch is either fully
// visible or not at all.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, but current is {actual}")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("Aggregate already exists: {0}")]
    AlreadyExists(Uuid),

    #[error("Aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    #[error("Cannot append empty event list")]
    EmptyAppend,

    #[error("Event sequence {got} does not follow version {expected}")]
    SequenceGap { expected: i64, got: i64 },
}

pub struct InMemoryEventStore<E: DomainEvent> {
    aggregate_type_name: String,
    logs: RwLock<HashMap<Uuid, Vec<EventEnvelope<E>>>>,
}

impl<E: DomainEvent> InMemoryEventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            aggregate_type_name: aggregate_type_name.to_string(),
            logs: RwLock::new(HashMap::new()),
        }
    }

    pub fn aggregate_type_name(&self) -> &str {
        &self.aggregate_type_name
    }

    /// Append events to the aggregate's log.
    /// Returns the new version number after appending.
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        if events.is_empty() {
            return Err(StoreError::EmptyAppend);
        }

        let mut logs = self.logs.write().await;
        let current_version = logs
            .get(&aggregate_id)
            .map_or(0, |log| log.len() as i64);

        if expected_version == 0 && current_version > 0 {
            return Err(StoreError::AlreadyExists(aggregate_id));
        }
        if current_version != expected_version {
            tracing::warn!(
                aggregate_id = %aggregate_id,
                aggregate_type = %self.aggregate_type_name,
                expected = expected_version,
                actual = current_version,
                "Optimistic concurrency check failed"
            );
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        for (offset, envelope) in events.iter().enumerate() {
            let expected_seq = expected_version + offset as i64 + 1;
            if envelope.sequence_number != expected_seq {
                return Err(StoreError::SequenceGap {
                    expected: expected_seq - 1,
                    got: envelope.sequence_number,
                });
            }
        }

        let event_count = events.len();
        let log = logs.entry(aggregate_id).or_default();
        log.extend(events);
        let new_version = log.len() as i64;

        tracing::info!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = event_count,
            "✅ Appended events to event store"
        );

        Ok(new_version)
    }

    /// Load all events for an aggregate, oldest first
    pub async fn load_events(&self, aggregate_id: Uuid) -> Vec<EventEnvelope<E>> {
        let logs = self.logs.read().await;
        let events = logs.get(&aggregate_id).cloned().unwrap_or_default();

        tracing::debug!(
            aggregate_id = %aggregate_id,
            event_count = events.len(),
            "Loaded events"
        );
        events
    }

    /// Get current version of aggregate (0 when it does not exist)
    pub async fn get_current_version(&self, aggregate_id: Uuid) -> i64 {
        let logs = self.logs.read().await;
        logs.get(&aggregate_id).map_or(0, |log| log.len() as i64)
    }

    /// Rebuild an aggregate by replaying its log
    pub async fn load_aggregate<A>(&self, aggregate_id: Uuid) -> Result<A>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let events = self.load_events(aggregate_id).await;

        if events.is_empty() {
            return Err(StoreError::AggregateNotFound(aggregate_id).into());
        }

        A::load_from_events(&events)
    }

    pub async fn aggregate_exists(&self, aggregate_id: Uuid) -> bool {
        self.get_current_version(aggregate_id).await > 0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
