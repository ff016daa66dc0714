// ============================================================================
// Admission Domain - Enrollment admission for capacity-limited club events
// ============================================================================
//
// This module contains ALL admission-specific code:
// - Value objects (ids, EnrollmentPolicy, EnrollmentState)
// - Records (EventRecord owning its EnrollmentRecords, capacity queries)
// - Commands (Enroll, Cancel, Accept, ...)
// - Events (domain facts) and Notifications (outbound)
// - Errors (AdmissionError, PolicyViolation)
// - Aggregate (decisions and state transitions)
// - Engine (synchronous facade over a snapshot)
// - Command Handler (load, decide, append, notify)
//
// ============================================================================

pub mod value_objects;
pub mod records;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod engine;
pub mod command_handler;

pub use value_objects::*;
pub use records::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use engine::*;
pub use command_handler::*;
