use crate::clock::{Clock, SystemClock};
use crate::event_sourcing::core::Aggregate;
use super::commands::AdmissionCommand;
use super::errors::AdmissionError;
use super::events::{AdmissionEvent, Notification};
use super::records::{EventDetails, EventRecord};
use super::value_objects::{EnrollmentId, ParticipantId};

// ============================================================================
// Admission Engine - synchronous entry point over an in-memory snapshot
// ============================================================================
//
// For callers that keep their own persistence: hand in a loaded EventRecord,
// get it back mutated along with the notifications to send once the new state
// is durably stored. Reads time from the injected clock once per call.
//
// ============================================================================

/// What one engine call did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Admission {
    /// Applied facts, in order. Empty for no-ops.
    pub events: Vec<AdmissionEvent>,
    /// To dispatch after persisting, in order
    pub notifications: Vec<Notification>,
}

impl Admission {
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdmissionEngine<C = SystemClock> {
    clock: C,
}

impl<C: Clock> AdmissionEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run any command against `record`. On error `record` is left untouched.
    pub fn execute(&self, record: &mut EventRecord, command: &AdmissionCommand) -> Result<Admission, AdmissionError> {
        let events = record.execute(command, self.clock.now())?;
        let notifications = events.iter().filter_map(|e| e.notification(record.id)).collect();

        Ok(Admission { events, notifications })
    }

    pub fn enroll(&self, record: &mut EventRecord, participant_id: ParticipantId) -> Result<Admission, AdmissionError> {
        self.execute(record, &AdmissionCommand::Enroll { participant_id })
    }

    pub fn cancel(&self, record: &mut EventRecord, participant_id: ParticipantId) -> Result<Admission, AdmissionError> {
        self.execute(record, &AdmissionCommand::Cancel { participant_id })
    }

    pub fn accept(&self, record: &mut EventRecord, enrollment_id: EnrollmentId) -> Result<Admission, AdmissionError> {
        self.execute(record, &AdmissionCommand::Accept { enrollment_id })
    }

    pub fn reject(&self, record: &mut EventRecord, enrollment_id: EnrollmentId) -> Result<Admission, AdmissionError> {
        self.execute(record, &AdmissionCommand::Reject { enrollment_id })
    }

    pub fn check_in(&self, record: &mut EventRecord, enrollment_id: EnrollmentId) -> Result<Admission, AdmissionError> {
        self.execute(record, &AdmissionCommand::CheckIn { enrollment_id })
    }

    pub fn check_out(&self, record: &mut EventRecord, enrollment_id: EnrollmentId) -> Result<Admission, AdmissionError> {
        self.execute(record, &AdmissionCommand::CheckOut { enrollment_id })
    }

    pub fn accept_waiting_list_up_to_capacity(&self, record: &mut EventRecord) -> Result<Admission, AdmissionError> {
        self.execute(record, &AdmissionCommand::AcceptWaitingListUpToCapacity)
    }

    pub fn update_event(&self, record: &mut EventRecord, details: EventDetails) -> Result<Admission, AdmissionError> {
        self.execute(record, &AdmissionCommand::UpdateEvent { details })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::admission::value_objects::{EnrollmentPolicy, EnrollmentState, EventId};
    use chrono::{DateTime, Duration, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-10T18:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn record(capacity_limit: Option<u32>) -> EventRecord {
        EventRecord::new(
            EventId::new(),
            EventDetails {
                title: "Photo walk".to_string(),
                capacity_limit,
                enrollment_window_end: t0() + Duration::days(1),
                starts_at: t0() + Duration::days(2),
                ends_at: t0() + Duration::days(2) + Duration::hours(2),
            },
            EnrollmentPolicy::default(),
        )
    }

    #[test]
    fn test_same_instant_enrollments_promote_in_insertion_order() {
        let engine = AdmissionEngine::new(FixedClock::new(t0()));
        let mut event = record(Some(1));
        let people: Vec<_> = (0..4).map(|_| ParticipantId::new()).collect();
        for p in &people {
            engine.enroll(&mut event, *p).unwrap();
        }

        let admission = engine.cancel(&mut event, people[0]).unwrap();

        assert_eq!(admission.notifications.len(), 1);
        assert_eq!(admission.notifications[0].participant_id(), people[1]);
    }

    #[test]
    fn test_noop_has_no_events_or_notifications() {
        let engine = AdmissionEngine::new(FixedClock::new(t0()));
        let mut event = record(Some(1));

        let admission = engine.cancel(&mut event, ParticipantId::new()).unwrap();

        assert!(admission.is_noop());
        assert!(admission.notifications.is_empty());
    }

    #[test]
    fn test_failed_call_leaves_record_untouched() {
        let engine = AdmissionEngine::new(FixedClock::new(t0()));
        let mut event = record(Some(1));
        let p = ParticipantId::new();
        let q = ParticipantId::new();
        engine.enroll(&mut event, p).unwrap();
        engine.enroll(&mut event, q).unwrap();
        let before = event.clone();

        let waiting = event.enrollment_for(q).unwrap().id;
        let result = engine.check_in(&mut event, waiting);

        assert!(matches!(result, Err(AdmissionError::NotConfirmed(_))));
        assert_eq!(event, before);
    }

    #[test]
    fn test_full_lifecycle_through_facade() {
        let engine = AdmissionEngine::new(FixedClock::new(t0()));
        let mut event = record(Some(1));
        let p = ParticipantId::new();
        let q = ParticipantId::new();

        engine.enroll(&mut event, p).unwrap();
        engine.enroll(&mut event, q).unwrap();
        let q_id = event.enrollment_for(q).unwrap().id;

        let accepted = engine.accept(&mut event, q_id).unwrap();
        assert_eq!(accepted.notifications.len(), 1);

        engine.check_in(&mut event, q_id).unwrap();
        assert_eq!(event.enrollment(q_id).unwrap().state(), EnrollmentState::CheckedIn);

        engine.check_out(&mut event, q_id).unwrap();
        let rejected = engine.reject(&mut event, q_id).unwrap();
        assert!(matches!(rejected.notifications[0], Notification::EnrollmentRejected { .. }));

        let mut details = event.details();
        details.capacity_limit = Some(2);
        let updated = engine.update_event(&mut event, details).unwrap();
        assert_eq!(updated.notifications.len(), 1);

        let bulk = engine.accept_waiting_list_up_to_capacity(&mut event).unwrap();
        assert!(bulk.is_noop());
        assert_eq!(event.accepted_count(), 2);
    }
}
