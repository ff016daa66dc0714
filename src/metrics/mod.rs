use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for the admission engine
// ============================================================================
//
// Covers:
// - Commands handled and ignored (no-ops by reason)
// - Domain events appended, promotions
// - Notifications dispatched / failed
// - Optimistic concurrency conflicts
//
// Exposition is left to the host application: gather `registry()` or call
// `render_text()`.
// ============================================================================

pub struct AdmissionMetrics {
    registry: Registry,

    pub commands_total: IntCounterVec,
    pub noops_total: IntCounterVec,
    pub command_duration: HistogramVec,

    pub events_appended: IntCounterVec,
    pub promotions_total: IntCounter,

    pub notifications_dispatched: IntCounterVec,
    pub notifications_failed: IntCounterVec,

    pub concurrency_conflicts: IntCounter,
}

impl AdmissionMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let commands_total = IntCounterVec::new(
            Opts::new("admission_commands_total", "Admission commands handled"),
            &["command", "outcome"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let noops_total = IntCounterVec::new(
            Opts::new("admission_noops_total", "Enroll/cancel requests ignored by policy"),
            &["command", "reason"],
        )?;
        registry.register(Box::new(noops_total.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("admission_command_duration_seconds", "Load, decide and append duration")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["command"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        let events_appended = IntCounterVec::new(
            Opts::new("admission_events_appended_total", "Domain events committed"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_appended.clone()))?;

        let promotions_total = IntCounter::new(
            "admission_promotions_total",
            "Waitlisted enrollments promoted automatically",
        )?;
        registry.register(Box::new(promotions_total.clone()))?;

        let notifications_dispatched = IntCounterVec::new(
            Opts::new("admission_notifications_dispatched_total", "Notifications handed to the port"),
            &["kind"],
        )?;
        registry.register(Box::new(notifications_dispatched.clone()))?;

        let notifications_failed = IntCounterVec::new(
            Opts::new("admission_notifications_failed_total", "Notifications the port refused"),
            &["kind"],
        )?;
        registry.register(Box::new(notifications_failed.clone()))?;

        let concurrency_conflicts = IntCounter::new(
            "admission_concurrency_conflicts_total",
            "Appends refused because another writer committed first",
        )?;
        registry.register(Box::new(concurrency_conflicts.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            noops_total,
            command_duration,
            events_appended,
            promotions_total,
            notifications_dispatched,
            notifications_failed,
            concurrency_conflicts,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of everything registered
    pub fn render_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_command(&self, command: &str, outcome: &str, duration_secs: f64) {
        self.commands_total.with_label_values(&[command, outcome]).inc();
        self.command_duration.with_label_values(&[command]).observe(duration_secs);
    }

    pub fn record_noop(&self, command: &str, reason: &str) {
        self.noops_total.with_label_values(&[command, reason]).inc();
    }

    pub fn record_event_appended(&self, event_type: &str) {
        self.events_appended.with_label_values(&[event_type]).inc();
    }

    pub fn record_promotion(&self) {
        self.promotions_total.inc();
    }

    pub fn record_notification(&self, kind: &str, delivered: bool) {
        if delivered {
            self.notifications_dispatched.with_label_values(&[kind]).inc();
        } else {
            self.notifications_failed.with_label_values(&[kind]).inc();
        }
    }

    pub fn record_conflict(&self) {
        self.concurrency_conflicts.inc();
    }
}
