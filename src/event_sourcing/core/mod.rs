// ============================================================================
// Event Sourcing Core - Generic Abstractions
// ============================================================================
//
// Nothing in here knows about club events or enrollments.
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::Aggregate;
pub use event::{DomainEvent, EventEnvelope, serialize_event, deserialize_event};
