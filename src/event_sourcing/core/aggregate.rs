use uuid::Uuid;
use anyhow::Result;
use chrono::{DateTime, Utc};
use super::event::EventEnvelope;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. Commands are decided against the current state, never mutate it
// 2. Decisions are expressed as events (facts that already happened)
// 3. State only changes by applying events
// 4. Time is injected, so replaying the same events yields the same state
//
// ============================================================================

/// Generic Aggregate trait - all event-sourced aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Create new aggregate from first event
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Decide which events a command produces at instant `now`.
    /// An empty list means the command was a no-op.
    fn handle_command(
        &self,
        command: &Self::Command,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self::Event>, Self::Error>;

    /// Get aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Get current version (number of applied events)
    fn version(&self) -> i64;

    /// Decide and apply in one step. Nothing is applied if the decision fails.
    fn execute(
        &mut self,
        command: &Self::Command,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command, now)?;
        for event in &events {
            self.apply_event(event)?;
        }
        Ok(events)
    }

    /// Load aggregate from event history (reconstruct from events)
    fn load_from_events(events: &[EventEnvelope<Self::Event>]) -> Result<Self>
    where
        Self::Error: std::fmt::Display,
    {
        let Some((first, rest)) = events.split_first() else {
            anyhow::bail!("No events to load");
        };

        let mut aggregate = Self::apply_first_event(&first.event_data)
            .map_err(|e| anyhow::anyhow!("Failed to apply first event: {}", e))?;

        for envelope in rest {
            aggregate.apply_event(&envelope.event_data)
                .map_err(|e| anyhow::anyhow!(
                    "Failed to apply event {} (seq {}): {}",
                    envelope.event_type,
                    envelope.sequence_number,
                    e
                ))?;
        }

        Ok(aggregate)
    }
}
