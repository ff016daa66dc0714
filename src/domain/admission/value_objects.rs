use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Admission Value Objects
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Club event identity
    EventId
);
uuid_id!(
    /// Account identity of whoever enrolls
    ParticipantId
);
uuid_id!(EnrollmentId);

/// How an event fills its confirmed slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnrollmentPolicy {
    /// Accept on enroll while slots remain; promote waiters automatically
    #[default]
    FirstComeFirstServed,
    /// Everyone waits until an organizer accepts them
    ConfirmativeByOrganizer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentState {
    Waitlisted,
    Confirmed,
    CheckedIn,
}

/// Why an accepted notification was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptReason {
    /// A freed or added slot went to the head of the waiting list
    Promoted,
    /// Manual organizer decision, capacity not consulted
    Organizer,
}

impl AcceptReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AcceptReason::Promoted => "promoted",
            AcceptReason::Organizer => "organizer",
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
    fn test_ids_are_distinct_and_display_as_uuid() {
        let a = ParticipantId::new();
        let b = ParticipantId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_uuid().to_string());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = EnrollmentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }

    #[test]
    fn test_default_policy_is_first_come_first_served() {
        assert_eq!(EnrollmentPolicy::default(), EnrollmentPolicy::FirstComeFirstServed);
    }

    #[test]
    fn test_policy_serialization() {
        let json = serde_json::to_string(&EnrollmentPolicy::ConfirmativeByOrganizer).unwrap();
        let back: EnrollmentPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EnrollmentPolicy::ConfirmativeByOrganizer);
    }
}
