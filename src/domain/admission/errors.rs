use super::value_objects::{EnrollmentId, ParticipantId};

// ============================================================================
// Admission Business Rule Errors
// ============================================================================

/// Why an enroll or cancel request was ignored.
///
/// These never surface as errors: the request becomes a no-op so callers can
/// safely repeat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Enrollment window has closed")]
    EnrollmentClosed,

    #[error("Participant is already enrolled")]
    AlreadyEnrolled,

    #[error("Participant is not enrolled")]
    NotEnrolled,

    #[error("Participant has already checked in")]
    AlreadyAttended,
}

impl PolicyViolation {
    /// Stable label for metrics
    pub const fn as_str(&self) -> &'static str {
        match self {
            PolicyViolation::EnrollmentClosed => "enrollment_closed",
            PolicyViolation::AlreadyEnrolled => "already_enrolled",
            PolicyViolation::NotEnrolled => "not_enrolled",
            PolicyViolation::AlreadyAttended => "already_attended",
        }
    }
}

/// Caller contract breaches and rejected event edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("Enrollment not found: {0}")]
    EnrollmentNotFound(EnrollmentId),

    #[error("Enrollment {0} is not confirmed and cannot check in")]
    NotConfirmed(EnrollmentId),

    #[error("Participant {0} is already enrolled in this event")]
    DuplicateEnrollment(ParticipantId),

    #[error("Capacity {requested} is below the {accepted} already accepted enrollments")]
    CapacityBelowAccepted { requested: u32, accepted: usize },

    #[error("Enrollment window must close before the event starts")]
    EnrollmentWindowAfterStart,

    #[error("Event must end after it starts")]
    EndsBeforeStart,

    #[error("Aggregate not initialized")]
    NotInitialized,
}
