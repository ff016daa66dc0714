// ============================================================================
// Club Admission - enrollment admission with waitlist promotion
// ============================================================================

pub mod clock;
pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod notifications;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AdmissionConfig;
pub use domain::admission::{
    AdmissionCommand, AdmissionCommandHandler, AdmissionEngine, AdmissionError, AdmissionEvent,
    EnrollmentPolicy, EnrollmentRecord, EnrollmentState, EventDetails, EventId, EventRecord,
    HandlerError, Notification, ParticipantId, PolicyViolation, ScheduleEvent,
};
pub use metrics::AdmissionMetrics;
pub use notifications::{NotificationPort, RecordingNotifier, TracingNotifier};
