use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::core::Aggregate;
use super::commands::{AdmissionCommand, ScheduleEvent};
use super::errors::{AdmissionError, PolicyViolation};
use super::events::*;
use super::records::{EnrollmentRecord, EventDetails, EventRecord};
use super::value_objects::{AcceptReason, EnrollmentId, ParticipantId};

// ============================================================================
// Admission Aggregate - Enrollment decisions for one club event
// ============================================================================
//
// Decisions are computed against the full enrollment list, so all commands for
// one event must be serialized (the command handler does it with optimistic
// concurrency).
//
// Capacity is never exceeded by enroll or automatic promotion. Accept is the
// organizer's override and may exceed it.
//
// ============================================================================

impl EventRecord {
    /// Validate a new event and produce its first event
    pub fn schedule(command: &ScheduleEvent) -> Result<AdmissionEvent, AdmissionError> {
        command.details.validate_schedule()?;

        Ok(AdmissionEvent::Scheduled(EventScheduled {
            event_id: command.event_id,
            details: command.details.clone(),
            policy: command.policy,
        }))
    }

    fn decide_enroll(&self, participant_id: ParticipantId, now: DateTime<Utc>) -> Vec<AdmissionEvent> {
        if let Err(violation) = self.check_enroll(participant_id, now) {
            self.log_noop("enroll", participant_id, violation);
            return vec![];
        }

        vec![AdmissionEvent::EnrollmentCreated(EnrollmentCreated {
            enrollment_id: EnrollmentId::new(),
            participant_id,
            enrolled_at: now,
            accepted: self.is_auto_accept_eligible(),
        })]
    }

    fn decide_cancel(&self, participant_id: ParticipantId, now: DateTime<Utc>) -> Vec<AdmissionEvent> {
        let enrollment = match self.check_cancel(participant_id, now) {
            Ok(enrollment) => enrollment,
            Err(violation) => {
                self.log_noop("cancel", participant_id, violation);
                return vec![];
            }
        };

        let mut events = vec![AdmissionEvent::EnrollmentCancelled(EnrollmentCancelled {
            enrollment_id: enrollment.id,
            participant_id,
            was_accepted: enrollment.accepted,
        })];

        // One freed slot, at most one promotion
        if enrollment.accepted {
            let accepted_after = self.accepted_count() - 1;
            if let Some(next) = self.promotable(self.capacity_limit, accepted_after).first() {
                events.push(promotion(next));
            }
        }

        events
    }

    fn decide_update(&self, details: &EventDetails) -> Result<Vec<AdmissionEvent>, AdmissionError> {
        details.validate_schedule()?;

        let accepted = self.accepted_count();
        if let Some(limit) = details.capacity_limit {
            if (limit as usize) < accepted {
                return Err(AdmissionError::CapacityBelowAccepted { requested: limit, accepted });
            }
        }

        let mut events = vec![AdmissionEvent::Updated(EventUpdated { details: details.clone() })];
        events.extend(
            self.promotable(details.capacity_limit, accepted)
                .into_iter()
                .map(promotion),
        );
        Ok(events)
    }

    fn existing(&self, enrollment_id: EnrollmentId) -> Result<&EnrollmentRecord, AdmissionError> {
        self.enrollment(enrollment_id)
            .ok_or(AdmissionError::EnrollmentNotFound(enrollment_id))
    }

    fn log_noop(&self, command: &str, participant_id: ParticipantId, violation: PolicyViolation) {
        tracing::debug!(
            event_id = %self.id,
            participant_id = %participant_id,
            command = command,
            reason = %violation,
            "Ignoring request"
        );
    }
}

fn promotion(enrollment: &EnrollmentRecord) -> AdmissionEvent {
    AdmissionEvent::EnrollmentAccepted(EnrollmentAccepted {
        enrollment_id: enrollment.id,
        participant_id: enrollment.participant_id,
        reason: AcceptReason::Promoted,
    })
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for EventRecord {
    type Event = AdmissionEvent;
    type Command = AdmissionCommand;
    type Error = AdmissionError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            AdmissionEvent::Scheduled(e) => {
                let mut record = EventRecord::new(e.event_id, e.details.clone(), e.policy);
                record.version = 1;
                Ok(record)
            }
            _ => Err(AdmissionError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            AdmissionEvent::Scheduled(_) => {
                // Already applied in apply_first_event
            }
            AdmissionEvent::Updated(e) => {
                self.title = e.details.title.clone();
                self.capacity_limit = e.details.capacity_limit;
                self.enrollment_window_end = e.details.enrollment_window_end;
                self.starts_at = e.details.starts_at;
                self.ends_at = e.details.ends_at;
            }
            AdmissionEvent::EnrollmentCreated(e) => {
                if self.enrollment_for(e.participant_id).is_some() {
                    return Err(AdmissionError::DuplicateEnrollment(e.participant_id));
                }
                self.enrollments.push(EnrollmentRecord {
                    id: e.enrollment_id,
                    event_id: self.id,
                    participant_id: e.participant_id,
                    enrolled_at: e.enrolled_at,
                    accepted: e.accepted,
                    attended: false,
                });
            }
            AdmissionEvent::EnrollmentCancelled(e) => {
                let position = self
                    .enrollments
                    .iter()
                    .position(|r| r.id == e.enrollment_id)
                    .ok_or(AdmissionError::EnrollmentNotFound(e.enrollment_id))?;
                // `remove`, not `swap_remove`: order is waitlist priority
                self.enrollments.remove(position);
            }
            AdmissionEvent::EnrollmentAccepted(e) => {
                self.enrollment_mut(e.enrollment_id)?.accepted = true;
            }
            AdmissionEvent::EnrollmentRejected(e) => {
                let enrollment = self.enrollment_mut(e.enrollment_id)?;
                enrollment.accepted = false;
                enrollment.attended = false;
            }
            AdmissionEvent::CheckedIn(e) => {
                self.enrollment_mut(e.enrollment_id)?.attended = true;
            }
            AdmissionEvent::CheckedOut(e) => {
                self.enrollment_mut(e.enrollment_id)?.attended = false;
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(
        &self,
        command: &Self::Command,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AdmissionCommand::Enroll { participant_id } => Ok(self.decide_enroll(*participant_id, now)),

            AdmissionCommand::Cancel { participant_id } => Ok(self.decide_cancel(*participant_id, now)),

            AdmissionCommand::Accept { enrollment_id } => {
                let enrollment = self.existing(*enrollment_id)?;

                Ok(vec![AdmissionEvent::EnrollmentAccepted(EnrollmentAccepted {
                    enrollment_id: enrollment.id,
                    participant_id: enrollment.participant_id,
                    reason: AcceptReason::Organizer,
                })])
            }

            // Rejection corrects an over-admitted entry; it does not promote
            AdmissionCommand::Reject { enrollment_id } => {
                let enrollment = self.existing(*enrollment_id)?;

                Ok(vec![AdmissionEvent::EnrollmentRejected(EnrollmentRejected {
                    enrollment_id: enrollment.id,
                    participant_id: enrollment.participant_id,
                })])
            }

            AdmissionCommand::CheckIn { enrollment_id } => {
                let enrollment = self.existing(*enrollment_id)?;
                if !enrollment.accepted {
                    return Err(AdmissionError::NotConfirmed(enrollment.id));
                }

                Ok(vec![AdmissionEvent::CheckedIn(EnrollmentCheckedIn {
                    enrollment_id: enrollment.id,
                })])
            }

            AdmissionCommand::CheckOut { enrollment_id } => {
                let enrollment = self.existing(*enrollment_id)?;

                Ok(vec![AdmissionEvent::CheckedOut(EnrollmentCheckedOut {
                    enrollment_id: enrollment.id,
                })])
            }

            AdmissionCommand::AcceptWaitingListUpToCapacity => Ok(self
                .promotable(self.capacity_limit, self.accepted_count())
                .into_iter()
                .map(promotion)
                .collect()),

            AdmissionCommand::UpdateEvent { details } => self.decide_update(details),
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id.as_uuid()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
