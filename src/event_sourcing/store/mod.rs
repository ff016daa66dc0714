// ============================================================================
// Event Sourcing Store
// ============================================================================
//
// Versioned, append-only event logs keyed by aggregate id.
//
// ============================================================================

pub mod event_store;

pub use event_store::{InMemoryEventStore, StoreError};
