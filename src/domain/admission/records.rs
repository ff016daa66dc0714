use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::errors::{AdmissionError, PolicyViolation};
use super::value_objects::{EnrollmentId, EnrollmentPolicy, EnrollmentState, EventId, ParticipantId};

// ============================================================================
// Enrollment Record
// ============================================================================

/// One participant's place in an event. Refers to the event and participant by
/// identity only; the owning `EventRecord` holds the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub id: EnrollmentId,
    pub event_id: EventId,
    pub participant_id: ParticipantId,
    pub enrolled_at: DateTime<Utc>,
    /// Holds a confirmed slot; `false` means waitlisted
    pub accepted: bool,
    /// Checked in. Only meaningful while `accepted`
    pub attended: bool,
}

impl EnrollmentRecord {
    pub fn state(&self) -> EnrollmentState {
        match (self.accepted, self.attended) {
            (true, true) => EnrollmentState::CheckedIn,
            (true, false) => EnrollmentState::Confirmed,
            (false, _) => EnrollmentState::Waitlisted,
        }
    }
}

// ============================================================================
// Event Details - the editable part of an event
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub title: String,
    /// `None` means unlimited
    pub capacity_limit: Option<u32>,
    pub enrollment_window_end: DateTime<Utc>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl EventDetails {
    pub fn validate_schedule(&self) -> Result<(), AdmissionError> {
        if self.enrollment_window_end > self.starts_at {
            return Err(AdmissionError::EnrollmentWindowAfterStart);
        }
        if self.ends_at <= self.starts_at {
            return Err(AdmissionError::EndsBeforeStart);
        }
        Ok(())
    }
}

// ============================================================================
// Event Record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub version: i64,

    pub title: String,
    pub capacity_limit: Option<u32>,
    pub enrollment_window_end: DateTime<Utc>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub policy: EnrollmentPolicy,

    /// Insertion order is enrollment order and breaks `enrolled_at` ties
    pub enrollments: Vec<EnrollmentRecord>,
}

impl EventRecord {
    /// A fresh record with no enrollments. Does not validate the schedule;
    /// `ScheduleEvent` does.
    pub fn new(id: EventId, details: EventDetails, policy: EnrollmentPolicy) -> Self {
        Self {
            id,
            version: 0,
            title: details.title,
            capacity_limit: details.capacity_limit,
            enrollment_window_end: details.enrollment_window_end,
            starts_at: details.starts_at,
            ends_at: details.ends_at,
            policy,
            enrollments: Vec::new(),
        }
    }

    pub fn details(&self) -> EventDetails {
        EventDetails {
            title: self.title.clone(),
            capacity_limit: self.capacity_limit,
            enrollment_window_end: self.enrollment_window_end,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }

    pub fn is_open_for_enrollment(&self, now: DateTime<Utc>) -> bool {
        now < self.enrollment_window_end
    }

    pub fn is_enrollable_for(&self, participant: ParticipantId, now: DateTime<Utc>) -> bool {
        self.check_enroll(participant, now).is_ok()
    }

    pub fn is_cancellable_for(&self, participant: ParticipantId, now: DateTime<Utc>) -> bool {
        self.is_open_for_enrollment(now) && self.enrollment_for(participant).is_some()
    }

    /// Whether an enroll request would go through, and if not, why
    pub fn check_enroll(&self, participant: ParticipantId, now: DateTime<Utc>) -> Result<(), PolicyViolation> {
        if !self.is_open_for_enrollment(now) {
            return Err(PolicyViolation::EnrollmentClosed);
        }
        if self.enrollment_for(participant).is_some() {
            return Err(PolicyViolation::AlreadyEnrolled);
        }
        Ok(())
    }

    /// Like `is_cancellable_for`, plus the check-in guard. Returns the record
    /// that would be removed.
    pub fn check_cancel(
        &self,
        participant: ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<&EnrollmentRecord, PolicyViolation> {
        if !self.is_open_for_enrollment(now) {
            return Err(PolicyViolation::EnrollmentClosed);
        }
        let enrollment = self
            .enrollment_for(participant)
            .ok_or(PolicyViolation::NotEnrolled)?;
        if enrollment.attended {
            return Err(PolicyViolation::AlreadyAttended);
        }
        Ok(enrollment)
    }

    pub fn is_attended(&self, participant: ParticipantId) -> bool {
        self.enrollment_for(participant).is_some_and(|e| e.attended)
    }

    pub fn enrollment_for(&self, participant: ParticipantId) -> Option<&EnrollmentRecord> {
        self.enrollments.iter().find(|e| e.participant_id == participant)
    }

    pub fn enrollment(&self, id: EnrollmentId) -> Option<&EnrollmentRecord> {
        self.enrollments.iter().find(|e| e.id == id)
    }

    pub(crate) fn enrollment_mut(&mut self, id: EnrollmentId) -> Result<&mut EnrollmentRecord, AdmissionError> {
        self.enrollments
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AdmissionError::EnrollmentNotFound(id))
    }

    pub fn accepted_count(&self) -> usize {
        self.enrollments.iter().filter(|e| e.accepted).count()
    }

    pub fn waitlist_count(&self) -> usize {
        self.enrollments.len() - self.accepted_count()
    }

    /// `None` when capacity is unlimited. Saturates at zero when organizer
    /// overrides have pushed the accepted count past the limit.
    pub fn remaining_confirmed_slots(&self) -> Option<u32> {
        self.capacity_limit.map(|limit| {
            let accepted = u32::try_from(self.accepted_count()).unwrap_or(u32::MAX);
            limit.saturating_sub(accepted)
        })
    }

    pub fn is_auto_accept_eligible(&self) -> bool {
        self.policy == EnrollmentPolicy::FirstComeFirstServed
            && self.remaining_confirmed_slots().map_or(true, |slots| slots > 0)
    }

    /// Waitlisted enrollments in promotion order: earliest `enrolled_at`
    /// first, insertion order on ties.
    pub fn waiting_list(&self) -> Vec<&EnrollmentRecord> {
        let mut waiting: Vec<_> = self.enrollments.iter().filter(|e| !e.accepted).collect();
        // stable sort
        waiting.sort_by_key(|e| e.enrolled_at);
        waiting
    }

    /// Head of the waiting list that fits into `capacity_limit` given
    /// `accepted` confirmed slots. Empty unless the policy promotes
    /// automatically.
    pub(crate) fn promotable(&self, capacity_limit: Option<u32>, accepted: usize) -> Vec<&EnrollmentRecord> {
        if self.policy != EnrollmentPolicy::FirstComeFirstServed {
            return Vec::new();
        }
        let waiting = self.waiting_list();
        let free = match capacity_limit {
            None => waiting.len(),
            Some(limit) => (limit as usize).saturating_sub(accepted),
        };
        waiting.into_iter().take(free).collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
