use serde::{Deserialize, Serialize};

use super::records::EventDetails;
use super::value_objects::{EnrollmentId, EnrollmentPolicy, EventId, ParticipantId};

// ============================================================================
// Admission Commands - Represent participant or organizer intent
// ============================================================================

/// Creates the aggregate; handled outside `AdmissionCommand` because there is
/// no record to decide against yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub event_id: EventId,
    pub details: EventDetails,
    pub policy: EnrollmentPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdmissionCommand {
    Enroll {
        participant_id: ParticipantId,
    },
    Cancel {
        participant_id: ParticipantId,
    },
    /// Organizer override, ignores capacity
    Accept {
        enrollment_id: EnrollmentId,
    },
    Reject {
        enrollment_id: EnrollmentId,
    },
    CheckIn {
        enrollment_id: EnrollmentId,
    },
    CheckOut {
        enrollment_id: EnrollmentId,
    },
    AcceptWaitingListUpToCapacity,
    /// Replace the editable details; the policy is fixed at scheduling time
    UpdateEvent {
        details: EventDetails,
    },
}

impl AdmissionCommand {
    /// Stable label for logs and metrics
    pub const fn name(&self) -> &'static str {
        match self {
            AdmissionCommand::Enroll { .. } => "enroll",
            AdmissionCommand::Cancel { .. } => "cancel",
            AdmissionCommand::Accept { .. } => "accept",
            AdmissionCommand::Reject { .. } => "reject",
            AdmissionCommand::CheckIn { .. } => "check_in",
            AdmissionCommand::CheckOut { .. } => "check_out",
            AdmissionCommand::AcceptWaitingListUpToCapacity => "accept_waiting_list",
            AdmissionCommand::UpdateEvent { .. } => "update_event",
        }
    }

    /// The participant issuing the command, when it is a self-service one
    pub const fn participant(&self) -> Option<ParticipantId> {
        match self {
            AdmissionCommand::Enroll { participant_id } | AdmissionCommand::Cancel { participant_id } => {
                Some(*participant_id)
            }
            _ => None,
        }
    }
}
