// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain code only; the generic event sourcing pieces live in
// src/event_sourcing/.
//
// ============================================================================

pub mod admission;
