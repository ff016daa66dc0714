use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};
use crate::event_sourcing::store::{InMemoryEventStore, StoreError};
use crate::metrics::AdmissionMetrics;
use crate::notifications::NotificationPort;
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::commands::{AdmissionCommand, ScheduleEvent};
use super::errors::{AdmissionError, PolicyViolation};
use super::events::{AdmissionEvent, Notification};
use super::records::EventRecord;
use super::value_objects::{AcceptReason, EventId};

// ============================================================================
// Admission Command Handler
// ============================================================================
//
// Orchestrates: Load -> Decide -> Append (retry on conflict) -> Notify
//
// Notifications go out only after the append succeeded, in decision order.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IsTransient for HandlerError {
    fn is_transient(&self) -> bool {
        matches!(self, HandlerError::Store(StoreError::ConcurrencyConflict { .. }))
    }
}

/// Result of one handled command
#[derive(Debug, Clone, PartialEq)]
pub struct HandledCommand {
    /// Aggregate version after the command
    pub version: i64,
    pub events: Vec<AdmissionEvent>,
    pub notifications: Vec<Notification>,
}

impl HandledCommand {
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

pub struct AdmissionCommandHandler<C = SystemClock> {
    event_store: Arc<InMemoryEventStore<AdmissionEvent>>,
    notifier: Arc<dyn NotificationPort>,
    metrics: Arc<AdmissionMetrics>,
    clock: C,
    retry: RetryConfig,
}

impl<C: Clock> AdmissionCommandHandler<C> {
    pub fn new(
        event_store: Arc<InMemoryEventStore<AdmissionEvent>>,
        notifier: Arc<dyn NotificationPort>,
        metrics: Arc<AdmissionMetrics>,
        clock: C,
    ) -> Self {
        Self {
            event_store,
            notifier,
            metrics,
            clock,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn event_store(&self) -> &Arc<InMemoryEventStore<AdmissionEvent>> {
        &self.event_store
    }

    /// Create a new event aggregate
    pub async fn schedule(&self, command: ScheduleEvent, correlation_id: Uuid) -> Result<EventRecord, HandlerError> {
        let event = EventRecord::schedule(&command)?;
        let record = EventRecord::apply_first_event(&event)?;
        let aggregate_id = record.aggregate_id();

        let envelope = EventEnvelope::new(aggregate_id, 1, event, correlation_id, self.clock.now());
        let event_type = envelope.event_type.clone();
        self.event_store.append_events(aggregate_id, 0, vec![envelope]).await?;
        self.metrics.record_event_appended(&event_type);

        tracing::info!(
            event_id = %record.id,
            title = %record.title,
            capacity_limit = ?record.capacity_limit,
            policy = ?record.policy,
            "Scheduled event"
        );
        Ok(record)
    }

    /// Current state of an event, rebuilt from its log
    pub async fn load(&self, event_id: EventId) -> Result<EventRecord, HandlerError> {
        let aggregate_id = event_id.as_uuid();
        if !self.event_store.aggregate_exists(aggregate_id).await {
            return Err(StoreError::AggregateNotFound(aggregate_id).into());
        }
        Ok(self.event_store.load_aggregate::<EventRecord>(aggregate_id).await?)
    }

    /// Handle a command, persist its events, then dispatch notifications
    pub async fn handle(
        &self,
        event_id: EventId,
        command: AdmissionCommand,
        correlation_id: Uuid,
    ) -> Result<HandledCommand, HandlerError> {
        let started = Instant::now();
        let command = &command;

        let result = retry_on_transient(&self.retry, move |attempt| {
            self.try_handle(event_id, command, correlation_id, attempt)
        })
        .await
        .into_result();

        let outcome = match &result {
            Ok(handled) if handled.is_noop() => "noop",
            Ok(_) => "applied",
            Err(HandlerError::Admission(_)) => "rejected",
            Err(_) => "failed",
        };
        self.metrics
            .record_command(command.name(), outcome, started.elapsed().as_secs_f64());

        let handled = result.map_err(|error| {
            tracing::warn!(
                event_id = %event_id,
                command = command.name(),
                error = %error,
                "Command failed"
            );
            error
        })?;

        self.dispatch(&handled.notifications).await;
        Ok(handled)
    }

    async fn try_handle(
        &self,
        event_id: EventId,
        command: &AdmissionCommand,
        correlation_id: Uuid,
        attempt: u32,
    ) -> Result<HandledCommand, HandlerError> {
        let mut record = self.load(event_id).await?;
        let expected_version = record.version();
        let now = self.clock.now();

        let events = record.execute(command, now)?;

        if events.is_empty() {
            if let Some(violation) = ignored_because(&record, command, now) {
                self.metrics.record_noop(command.name(), violation.as_str());
            }
            return Ok(HandledCommand {
                version: expected_version,
                events,
                notifications: Vec::new(),
            });
        }

        let aggregate_id = event_id.as_uuid();
        let envelopes: Vec<_> = events
            .iter()
            .cloned()
            .zip(expected_version + 1..)
            .map(|(event, seq)| {
                let envelope = EventEnvelope::new(aggregate_id, seq, event, correlation_id, now)
                    .with_metadata("command", command.name())
                    .with_metadata("attempt", attempt.to_string());
                match command.participant() {
                    Some(participant) => envelope.with_actor(participant.as_uuid()),
                    None => envelope,
                }
            })
            .collect();

        let version = match self.event_store.append_events(aggregate_id, expected_version, envelopes).await {
            Ok(version) => version,
            Err(error) => {
                if matches!(error, StoreError::ConcurrencyConflict { .. }) {
                    self.metrics.record_conflict();
                }
                return Err(error.into());
            }
        };

        for event in &events {
            self.metrics.record_event_appended(event.event_type());
            if let AdmissionEvent::EnrollmentAccepted(accepted) = event {
                if accepted.reason == AcceptReason::Promoted {
                    self.metrics.record_promotion();
                }
            }
        }

        tracing::info!(
            event_id = %event_id,
            command = command.name(),
            version = version,
            accepted = record.accepted_count(),
            waitlisted = record.waitlist_count(),
            "Command applied"
        );

        let notifications = events.iter().filter_map(|e| e.notification(event_id)).collect();
        Ok(HandledCommand { version, events, notifications })
    }

    /// State is already committed here, so a failed delivery is logged and
    /// counted but does not fail the command.
    async fn dispatch(&self, notifications: &[Notification]) {
        for notification in notifications {
            let kind = notification.event_type();
            match self.notifier.dispatch(notification).await {
                Ok(()) => self.metrics.record_notification(kind, true),
                Err(error) => {
                    tracing::error!(
                        kind = kind,
                        enrollment_id = %notification.enrollment_id(),
                        error = %error,
                        "Notification dispatch failed"
                    );
                    self.metrics.record_notification(kind, false);
                }
            }
        }
    }
}

fn ignored_because(
    record: &EventRecord,
    command: &AdmissionCommand,
    now: chrono::DateTime<chrono::Utc>,
) -> Option<PolicyViolation> {
    match command {
        AdmissionCommand::Enroll { participant_id } => record.check_enroll(*participant_id, now).err(),
        AdmissionCommand::Cancel { participant_id } => record.check_cancel(*participant_id, now).err(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::admission::records::EventDetails;
    use crate::domain::admission::value_objects::{EnrollmentPolicy, EnrollmentState, ParticipantId};
    use crate::notifications::RecordingNotifier;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-09-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn schedule_command(capacity_limit: Option<u32>) -> ScheduleEvent {
        ScheduleEvent {
            event_id: EventId::new(),
            details: EventDetails {
                title: "Orientation".to_string(),
                capacity_limit,
                enrollment_window_end: t0() + Duration::days(1),
                starts_at: t0() + Duration::days(2),
                ends_at: t0() + Duration::days(2) + Duration::hours(1),
            },
            policy: EnrollmentPolicy::FirstComeFirstServed,
        }
    }

    fn handler_with(
        notifier: Arc<dyn NotificationPort>,
    ) -> (AdmissionCommandHandler<FixedClock>, Arc<AdmissionMetrics>) {
        let metrics = Arc::new(AdmissionMetrics::new().unwrap());
        let handler = AdmissionCommandHandler::new(
            Arc::new(InMemoryEventStore::new("ClubEvent")),
            notifier,
            metrics.clone(),
            FixedClock::new(t0()),
        )
        .with_retry(RetryConfig::immediate(3));
        (handler, metrics)
    }

    struct FailingNotifier;

    #[async_trait]
    impl NotificationPort for FailingNotifier {
        async fn dispatch(&self, _notification: &Notification) -> anyhow::Result<()> {
            anyhow::bail!("mail server down")
        }
    }

    #[tokio::test]
    async fn test_schedule_and_load() {
        let (handler, _) = handler_with(Arc::new(RecordingNotifier::new()));
        let command = schedule_command(Some(3));
        let event_id = command.event_id;

        let scheduled = handler.schedule(command, Uuid::new_v4()).await.unwrap();
        let loaded = handler.load(event_id).await.unwrap();

        assert_eq!(scheduled, loaded);
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_schedule_twice_fails() {
        let (handler, _) = handler_with(Arc::new(RecordingNotifier::new()));
        let command = schedule_command(Some(3));

        handler.schedule(command.clone(), Uuid::new_v4()).await.unwrap();
        let result = handler.schedule(command, Uuid::new_v4()).await;

        assert!(matches!(result, Err(HandlerError::Store(StoreError::AlreadyExists(_)))));
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let (handler, _) = handler_with(Arc::new(RecordingNotifier::new()));
        let result = handler
            .handle(EventId::new(), AdmissionCommand::AcceptWaitingListUpToCapacity, Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(HandlerError::Store(StoreError::AggregateNotFound(_)))));
    }

    #[tokio::test]
    async fn test_promotion_is_persisted_and_notified() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (handler, metrics) = handler_with(notifier.clone());
        let event_id = handler.schedule(schedule_command(Some(1)), Uuid::new_v4()).await.unwrap().id;

        let first = ParticipantId::new();
        let second = ParticipantId::new();
        for participant_id in [first, second] {
            handler
                .handle(event_id, AdmissionCommand::Enroll { participant_id }, Uuid::new_v4())
                .await
                .unwrap();
        }
        assert!(notifier.sent().await.is_empty());

        let handled = handler
            .handle(event_id, AdmissionCommand::Cancel { participant_id: first }, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(handled.version, 5);
        let sent = notifier.sent().await;
        assert_eq!(sent, handled.notifications);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].participant_id(), second);

        let stored = handler.load(event_id).await.unwrap();
        assert_eq!(stored.enrollment_for(second).map(|e| e.state()), Some(EnrollmentState::Confirmed));
        assert_eq!(metrics.promotions_total.get(), 1);
    }

    #[tokio::test]
    async fn test_noop_appends_nothing_and_counts_reason() {
        let (handler, metrics) = handler_with(Arc::new(RecordingNotifier::new()));
        let event_id = handler.schedule(schedule_command(None), Uuid::new_v4()).await.unwrap().id;
        let participant_id = ParticipantId::new();

        handler
            .handle(event_id, AdmissionCommand::Enroll { participant_id }, Uuid::new_v4())
            .await
            .unwrap();
        let again = handler
            .handle(event_id, AdmissionCommand::Enroll { participant_id }, Uuid::new_v4())
            .await
            .unwrap();

        assert!(again.is_noop());
        assert_eq!(again.version, 2);
        assert_eq!(handler.event_store().get_current_version(event_id.as_uuid()).await, 2);
        assert_eq!(
            metrics.noops_total.with_label_values(&["enroll", "already_enrolled"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn test_invariant_violation_surfaces_as_error() {
        let (handler, metrics) = handler_with(Arc::new(RecordingNotifier::new()));
        let event_id = handler.schedule(schedule_command(Some(1)), Uuid::new_v4()).await.unwrap().id;

        for _ in 0..2 {
            handler
                .handle(event_id, AdmissionCommand::Enroll { participant_id: ParticipantId::new() }, Uuid::new_v4())
                .await
                .unwrap();
        }
        let waiting = handler.load(event_id).await.unwrap().waiting_list()[0].id;

        let result = handler
            .handle(event_id, AdmissionCommand::CheckIn { enrollment_id: waiting }, Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(HandlerError::Admission(AdmissionError::NotConfirmed(_)))));
        assert_eq!(metrics.commands_total.with_label_values(&["check_in", "rejected"]).get(), 1);
    }

    #[tokio::test]
    async fn test_failed_notification_does_not_undo_commit() {
        let (handler, metrics) = handler_with(Arc::new(FailingNotifier));
        let event_id = handler.schedule(schedule_command(Some(1)), Uuid::new_v4()).await.unwrap().id;
        let participant_id = ParticipantId::new();
        handler
            .handle(event_id, AdmissionCommand::Enroll { participant_id }, Uuid::new_v4())
            .await
            .unwrap();
        let enrollment_id = handler.load(event_id).await.unwrap().enrollment_for(participant_id).unwrap().id;

        let handled = handler
            .handle(event_id, AdmissionCommand::Reject { enrollment_id }, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(handled.notifications.len(), 1);
        assert_eq!(metrics.notifications_failed.with_label_values(&["EnrollmentRejected"]).get(), 1);
        let stored = handler.load(event_id).await.unwrap();
        assert!(!stored.enrollment(enrollment_id).unwrap().accepted);
    }

    #[tokio::test]
    async fn test_envelopes_record_actor_and_command() {
        let (handler, _) = handler_with(Arc::new(RecordingNotifier::new()));
        let event_id = handler.schedule(schedule_command(None), Uuid::new_v4()).await.unwrap().id;
        let participant_id = ParticipantId::new();
        let correlation_id = Uuid::new_v4();

        handler
            .handle(event_id, AdmissionCommand::Enroll { participant_id }, correlation_id)
            .await
            .unwrap();

        let log = handler.event_store().load_events(event_id.as_uuid()).await;
        let last = log.last().unwrap();
        assert_eq!(last.event_type, "EnrollmentCreated");
        assert_eq!(last.sequence_number, 2);
        assert_eq!(last.actor_id, Some(participant_id.as_uuid()));
        assert_eq!(last.correlation_id, correlation_id);
        assert_eq!(last.metadata.get("command").map(String::as_str), Some("enroll"));
    }

    #[test]
    fn test_only_conflicts_are_transient() {
        let conflict = HandlerError::Store(StoreError::ConcurrencyConflict {
            aggregate_id: Uuid::new_v4(),
            expected: 1,
            actual: 2,
        });
        assert!(conflict.is_transient());
        assert!(!HandlerError::Admission(AdmissionError::NotInitialized).is_transient());
        assert!(!HandlerError::Store(StoreError::EmptyAppend).is_transient());
    }
}
