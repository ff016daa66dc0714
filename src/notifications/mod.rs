// ============================================================================
// Notification Port - outbound side of the admission engine
// ============================================================================
//
// The engine only produces `Notification` values. Whoever hosts it decides
// how they reach people (mail, push, in-app) by implementing this port.
//
// ============================================================================

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::admission::Notification;
use crate::event_sourcing::core::DomainEvent;

#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Deliver one notification. Called only after the state change that
    /// produced it has been committed.
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Writes each notification to the log
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationPort for TracingNotifier {
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()> {
        match notification {
            Notification::EnrollmentAccepted { event_id, enrollment_id, participant_id, reason } => {
                tracing::info!(
                    event_id = %event_id,
                    enrollment_id = %enrollment_id,
                    participant_id = %participant_id,
                    reason = reason.as_str(),
                    "📨 Enrollment accepted"
                );
            }
            Notification::EnrollmentRejected { event_id, enrollment_id, participant_id } => {
                tracing::info!(
                    event_id = %event_id,
                    enrollment_id = %enrollment_id,
                    participant_id = %participant_id,
                    "📨 Enrollment rejected"
                );
            }
        }
        Ok(())
    }
}

/// Keeps every dispatched notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    pub async fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()> {
        tracing::debug!(kind = notification.event_type(), "Recording notification");
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}
