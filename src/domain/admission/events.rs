use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::event_sourcing::core::DomainEvent;
use super::records::EventDetails;
use super::value_objects::{AcceptReason, EnrollmentId, EnrollmentPolicy, EventId, ParticipantId};

// ============================================================================
// Admission Events - Facts about one club event's enrollments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AdmissionEvent {
    Scheduled(EventScheduled),
    Updated(EventUpdated),
    EnrollmentCreated(EnrollmentCreated),
    EnrollmentCancelled(EnrollmentCancelled),
    EnrollmentAccepted(EnrollmentAccepted),
    EnrollmentRejected(EnrollmentRejected),
    CheckedIn(EnrollmentCheckedIn),
    CheckedOut(EnrollmentCheckedOut),
}

impl DomainEvent for AdmissionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AdmissionEvent::Scheduled(_) => "EventScheduled",
            AdmissionEvent::Updated(_) => "EventUpdated",
            AdmissionEvent::EnrollmentCreated(_) => "EnrollmentCreated",
            AdmissionEvent::EnrollmentCancelled(_) => "EnrollmentCancelled",
            AdmissionEvent::EnrollmentAccepted(_) => "EnrollmentAccepted",
            AdmissionEvent::EnrollmentRejected(_) => "EnrollmentRejected",
            AdmissionEvent::CheckedIn(_) => "EnrollmentCheckedIn",
            AdmissionEvent::CheckedOut(_) => "EnrollmentCheckedOut",
        }
    }
}

impl AdmissionEvent {
    /// The outbound notification this fact calls for, if any
    pub fn notification(&self, event_id: EventId) -> Option<Notification> {
        match self {
            AdmissionEvent::EnrollmentAccepted(e) => Some(Notification::EnrollmentAccepted {
                event_id,
                enrollment_id: e.enrollment_id,
                participant_id: e.participant_id,
                reason: e.reason,
            }),
            AdmissionEvent::EnrollmentRejected(e) => Some(Notification::EnrollmentRejected {
                event_id,
                enrollment_id: e.enrollment_id,
                participant_id: e.participant_id,
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// First event of every aggregate
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventScheduled {
    pub event_id: EventId,
    pub details: EventDetails,
    pub policy: EnrollmentPolicy,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventUpdated {
    pub details: EventDetails,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentCreated {
    pub enrollment_id: EnrollmentId,
    pub participant_id: ParticipantId,
    pub enrolled_at: DateTime<Utc>,
    /// Took a confirmed slot straight away
    pub accepted: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentCancelled {
    pub enrollment_id: EnrollmentId,
    pub participant_id: ParticipantId,
    pub was_accepted: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentAccepted {
    pub enrollment_id: EnrollmentId,
    pub participant_id: ParticipantId,
    pub reason: AcceptReason,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentRejected {
    pub enrollment_id: EnrollmentId,
    pub participant_id: ParticipantId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentCheckedIn {
    pub enrollment_id: EnrollmentId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnrollmentCheckedOut {
    pub enrollment_id: EnrollmentId,
}

// ============================================================================
// Notifications - what collaborators are told after a commit
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Notification {
    EnrollmentAccepted {
        event_id: EventId,
        enrollment_id: EnrollmentId,
        participant_id: ParticipantId,
        reason: AcceptReason,
    },
    EnrollmentRejected {
        event_id: EventId,
        enrollment_id: EnrollmentId,
        participant_id: ParticipantId,
    },
}

impl DomainEvent for Notification {
    fn event_type(&self) -> &'static str {
        match self {
            Notification::EnrollmentAccepted { .. } => "EnrollmentAccepted",
            Notification::EnrollmentRejected { .. } => "EnrollmentRejected",
        }
    }
}

impl Notification {
    pub const fn enrollment_id(&self) -> EnrollmentId {
        match self {
            Notification::EnrollmentAccepted { enrollment_id, .. }
            | Notification::EnrollmentRejected { enrollment_id, .. } => *enrollment_id,
        }
    }

    pub const fn participant_id(&self) -> ParticipantId {
        match self {
            Notification::EnrollmentAccepted { participant_id, .. }
            | Notification::EnrollmentRejected { participant_id, .. } => *participant_id,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_accept_and_reject_notify() {
        let event_id = EventId::new();
        let enrollment_id = EnrollmentId::new();
        let participant_id = ParticipantId::new();

        let accepted = AdmissionEvent::EnrollmentAccepted(EnrollmentAccepted {
            enrollment_id,
            participant_id,
            reason: AcceptReason::Promoted,
        });
        assert_eq!(
            accepted.notification(event_id),
            Some(Notification::EnrollmentAccepted {
                event_id,
                enrollment_id,
                participant_id,
                reason: AcceptReason::Promoted,
            })
        );

        let rejected = AdmissionEvent::EnrollmentRejected(EnrollmentRejected { enrollment_id, participant_id });
        let notification = rejected.notification(event_id).unwrap();
        assert_eq!(notification.enrollment_id(), enrollment_id);
        assert_eq!(notification.participant_id(), participant_id);

        let created = AdmissionEvent::EnrollmentCreated(EnrollmentCreated {
            enrollment_id,
            participant_id,
            enrolled_at: Utc::now(),
            accepted: true,
        });
        assert!(created.notification(event_id).is_none());
    }

    #[test]
    fn test_event_is_tagged_in_json() {
        let event = AdmissionEvent::CheckedIn(EnrollmentCheckedIn { enrollment_id: EnrollmentId::new() });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "CheckedIn");
        assert_eq!(event.event_type(), "EnrollmentCheckedIn");

        let back: AdmissionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
