use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::messaging::{DispatchObserver, EventEnvelope, HandlerOutcome};

// ============================================================================
// Metrics Module - Prometheus metrics for the message bus
// ============================================================================
//
// Provides metrics for:
// - Events published, by kind
// - Handler invocations and their outcome
// - Handler latency
// - Retries and dead letters (queued transport)
//
// All metrics are registered with one Prometheus registry, scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Publishing
    pub events_published: IntCounterVec,
    pub events_unhandled: IntCounterVec,

    // Handlers
    pub handler_invocations: IntCounterVec,
    pub handler_duration: HistogramVec,
    pub handler_retries: IntCounterVec,

    // Dead letters
    pub dead_letters_total: IntCounter,
    pub dead_letters_by_handler: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let events_published = IntCounterVec::new(
            Opts::new("bus_events_published_total", "Total events dispatched by the bus"),
            &["event_kind"],
        )?;
        registry.register(Box::new(events_published.clone()))?;

        let events_unhandled = IntCounterVec::new(
            Opts::new("bus_events_unhandled_total", "Events dispatched with no matching handler"),
            &["event_kind"],
        )?;
        registry.register(Box::new(events_unhandled.clone()))?;

        let handler_invocations = IntCounterVec::new(
            Opts::new("bus_handler_invocations_total", "Handler invocations by outcome"),
            &["kind", "handler", "outcome"],
        )?;
        registry.register(Box::new(handler_invocations.clone()))?;

        let handler_duration = HistogramVec::new(
            HistogramOpts::new("bus_handler_duration_seconds", "Handler duration, retries included")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["kind", "handler"],
        )?;
        registry.register(Box::new(handler_duration.clone()))?;

        let handler_retries = IntCounterVec::new(
            Opts::new("bus_handler_retries_total", "Extra attempts made after a transient failure"),
            &["kind", "handler"],
        )?;
        registry.register(Box::new(handler_retries.clone()))?;

        let dead_letters_total = IntCounter::new("bus_dead_letters_total", "Total dead-lettered deliveries")?;
        registry.register(Box::new(dead_letters_total.clone()))?;

        let dead_letters_by_handler = IntCounterVec::new(
            Opts::new("bus_dead_letters_by_handler_total", "Dead-lettered deliveries by handler"),
            &["kind", "handler"],
        )?;
        registry.register(Box::new(dead_letters_by_handler.clone()))?;

        Ok(Self {
            registry,
            events_published,
            events_unhandled,
            handler_invocations,
            handler_duration,
            handler_retries,
            dead_letters_total,
            dead_letters_by_handler,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every metric in the Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Helper to record one handler invocation
    pub fn record_handler(&self, kind: &str, handler: &str, success: bool, duration_secs: f64, attempts: u32) {
        let outcome = if success { "success" } else { "failure" };
        self.handler_invocations.with_label_values(&[kind, handler, outcome]).inc();
        self.handler_duration.with_label_values(&[kind, handler]).observe(duration_secs);
        if attempts > 1 {
            self.handler_retries
                .with_label_values(&[kind, handler])
                .inc_by(u64::from(attempts - 1));
        }
    }

    /// Helper to record a dead letter
    pub fn record_dead_letter(&self, kind: &str, handler: &str) {
        self.dead_letters_total.inc();
        self.dead_letters_by_handler.with_label_values(&[kind, handler]).inc();
    }
}

impl DispatchObserver for Metrics {
    fn event_published(&self, envelope: &EventEnvelope, handler_count: usize) {
        let kind = envelope.kind().as_str();
        self.events_published.with_label_values(&[kind]).inc();
        if handler_count == 0 {
            self.events_unhandled.with_label_values(&[kind]).inc();
        }
    }

    fn handler_completed(&self, outcome: &HandlerOutcome) {
        self.record_handler(
            outcome.kind,
            &outcome.handler,
            outcome.succeeded(),
            outcome.duration.as_secs_f64(),
            outcome.attempts,
        );
    }

    fn dead_lettered(&self, kind: &str, handler: &str) {
        self.record_dead_letter(kind, handler);
    }
}
