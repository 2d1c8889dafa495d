//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the payment system.
//!
//! # Metrics
//!
//! - `netting_payments_added_total` - Legs recorded
//! - `netting_payments_deleted_total` - Legs deleted by request
//! - `netting_passes_total` - Successful netting passes
//! - `netting_pass_failures_total` - Aborted netting passes
//! - `netting_legs_emitted_total` - Netted legs appended to the sink
//! - `netting_live_payments` - Legs currently in the registry
//! - `netting_pass_duration_seconds` - Histogram of pass latencies

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
///
/// Collectors register on this instance's own registry, so several
/// instances can coexist in one process.
#[derive(Clone)]
pub struct Metrics {
    /// Legs recorded
    pub payments_added: IntCounter,

    /// Legs deleted
    pub payments_deleted: IntCounter,

    /// Successful passes
    pub passes_total: IntCounter,

    /// Aborted passes
    pub pass_failures: IntCounter,

    /// Netted legs emitted
    pub legs_emitted: IntCounter,

    /// Live registry size
    pub live_payments: IntGauge,

    /// Pass duration histogram
    pub pass_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let payments_added =
            IntCounter::new("netting_payments_added_total", "Total number of legs recorded")?;
        registry.register(Box::new(payments_added.clone()))?;

        let payments_deleted =
            IntCounter::new("netting_payments_deleted_total", "Total number of legs deleted")?;
        registry.register(Box::new(payments_deleted.clone()))?;

        let passes_total =
            IntCounter::new("netting_passes_total", "Total number of successful netting passes")?;
        registry.register(Box::new(passes_total.clone()))?;

        let pass_failures =
            IntCounter::new("netting_pass_failures_total", "Total number of aborted netting passes")?;
        registry.register(Box::new(pass_failures.clone()))?;

        let legs_emitted =
            IntCounter::new("netting_legs_emitted_total", "Total number of netted legs emitted")?;
        registry.register(Box::new(legs_emitted.clone()))?;

        let live_payments = IntGauge::new("netting_live_payments", "Legs currently registered")?;
        registry.register(Box::new(live_payments.clone()))?;

        let pass_duration = Histogram::with_opts(
            HistogramOpts::new("netting_pass_duration_seconds", "Histogram of pass latencies")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.0]),
        )?;
        registry.register(Box::new(pass_duration.clone()))?;

        Ok(Self {
            payments_added,
            payments_deleted,
            passes_total,
            pass_failures,
            legs_emitted,
            live_payments,
            pass_duration,
            registry,
        })
    }

    /// Record leg added
    pub fn record_payment_added(&self, live: usize) {
        self.payments_added.inc();
        self.live_payments.set(live as i64);
    }

    /// Record leg deleted
    pub fn record_payment_deleted(&self, live: usize) {
        self.payments_deleted.inc();
        self.live_payments.set(live as i64);
    }

    /// Record successful pass
    pub fn record_pass(&self, legs_emitted: usize, live: usize, duration_seconds: f64) {
        self.passes_total.inc();
        self.legs_emitted.inc_by(legs_emitted as u64);
        self.live_payments.set(live as i64);
        self.pass_duration.observe(duration_seconds);
    }

    /// Record aborted pass
    pub fn record_pass_failure(&self) {
        self.pass_failures.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render in Prometheus text exposition format
    pub fn gather_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("payments_added", &self.payments_added.get())
            .field("passes_total", &self.passes_total.get())
            .field("live_payments", &self.live_payments.get())
            .finish()
    }
}
