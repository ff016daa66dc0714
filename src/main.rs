use std::sync::Arc;
use chrono::{Duration, Utc};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use club_admission::domain::admission::{
    AdmissionCommand, AdmissionCommandHandler, EventDetails, EventId, EnrollmentPolicy,
    ParticipantId, ScheduleEvent,
};
use club_admission::event_sourcing::InMemoryEventStore;
use club_admission::{AdmissionConfig, AdmissionMetrics, SystemClock, TracingNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AdmissionConfig::from_env()?;

    // RUST_LOG wins over ADMISSION_LOG_FILTER
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
        )
        .init();

    tracing::info!("🚀 Starting club admission demo");

    let metrics = Arc::new(AdmissionMetrics::new()?);
    let handler = AdmissionCommandHandler::new(
        Arc::new(InMemoryEventStore::new("ClubEvent")),
        Arc::new(TracingNotifier),
        metrics.clone(),
        SystemClock,
    )
    .with_retry(config.retry());

    // === 1. Schedule an event with two confirmed slots ===
    let now = Utc::now();
    let event_id = EventId::new();
    handler
        .schedule(
            ScheduleEvent {
                event_id,
                details: EventDetails {
                    title: "Climbing club taster session".to_string(),
                    capacity_limit: Some(2),
                    enrollment_window_end: now + Duration::days(6),
                    starts_at: now + Duration::days(7),
                    ends_at: now + Duration::days(7) + Duration::hours(2),
                },
                policy: EnrollmentPolicy::FirstComeFirstServed,
            },
            Uuid::new_v4(),
        )
        .await?;

    // === 2. Three people enroll: two confirmed, one waitlisted ===
    let (alice, bob, carol, dave) = (
        ParticipantId::new(),
        ParticipantId::new(),
        ParticipantId::new(),
        ParticipantId::new(),
    );
    for participant_id in [alice, bob, carol] {
        handler
            .handle(event_id, AdmissionCommand::Enroll { participant_id }, Uuid::new_v4())
            .await?;
    }

    // === 3. Alice cancels: Carol is promoted and notified ===
    handler
        .handle(event_id, AdmissionCommand::Cancel { participant_id: alice }, Uuid::new_v4())
        .await?;

    // === 4. Dave enrolls onto the waiting list, Bob checks in ===
    handler
        .handle(event_id, AdmissionCommand::Enroll { participant_id: dave }, Uuid::new_v4())
        .await?;

    let snapshot = handler.load(event_id).await?;
    if let Some(enrollment) = snapshot.enrollment_for(bob) {
        handler
            .handle(event_id, AdmissionCommand::CheckIn { enrollment_id: enrollment.id }, Uuid::new_v4())
            .await?;
    }

    // === 5. Bob can no longer cancel; Dave stays waitlisted ===
    let cancel = handler
        .handle(event_id, AdmissionCommand::Cancel { participant_id: bob }, Uuid::new_v4())
        .await?;
    tracing::info!(noop = cancel.is_noop(), "Checked-in participant tried to cancel");

    // === 6. Organizer raises capacity: Dave is promoted ===
    let mut details = handler.load(event_id).await?.details();
    details.capacity_limit = Some(3);
    handler
        .handle(event_id, AdmissionCommand::UpdateEvent { details }, Uuid::new_v4())
        .await?;

    let final_state = handler.load(event_id).await?;
    for enrollment in &final_state.enrollments {
        tracing::info!(
            participant_id = %enrollment.participant_id,
            state = ?enrollment.state(),
            enrolled_at = %enrollment.enrolled_at,
            "Final enrollment"
        );
    }

    tracing::info!(
        metric_families = metrics.registry().gather().len(),
        "📊 Metrics gathered"
    );
    tracing::debug!("\n{}", metrics.render_text()?);

    tracing::info!("🎉 Demo complete!");
    Ok(())
}
