//! Prometheus metrics collection for stickyd.
//!
//! Tracks refresh-cycle outcomes, load shedding, administrative operations,
//! platform call failures, and gateway session health.
//!
//! ## Sticky Metrics
//!
//! - `sticky_refresh_total{outcome}` - Refresh cycles by outcome
//! - `sticky_refresh_duration_seconds` - Time from lock to unlock
//! - `sticky_triggers_dropped_total` - Triggers dropped because the channel was mid-refresh
//! - `sticky_admin_ops_total{op,result}` - Create/delete operations
//! - `sticky_configured` - Records currently in the store

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Refresh cycles by outcome (refreshed, send_failed, no_sticky).
pub static REFRESH_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Triggers dropped while a refresh was in flight.
pub static TRIGGERS_DROPPED: OnceLock<IntCounter> = OnceLock::new();

/// Administrative operations by kind and result.
pub static ADMIN_OPS: OnceLock<IntCounterVec> = OnceLock::new();

/// Platform call failures by call and error code.
pub static PLATFORM_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Failed store flushes.
pub static STORE_WRITE_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Gateway sessions started (first connect and every reconnect).
pub static GATEWAY_SESSIONS: OnceLock<IntCounter> = OnceLock::new();

/// Text commands by subcommand and result.
pub static COMMANDS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges / Histograms
// ========================================================================

/// Sticky records currently configured.
pub static STICKIES_CONFIGURED: OnceLock<IntGauge> = OnceLock::new();

/// Duration of a refresh cycle.
pub static REFRESH_LATENCY: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded. Until
/// then every recorder below is a no-op.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(REFRESH_TOTAL, IntCounterVec::new(Opts::new("sticky_refresh_total", "Refresh cycles by outcome"), &["outcome"]));
    register!(TRIGGERS_DROPPED, IntCounter::new("sticky_triggers_dropped_total", "Triggers dropped while the channel was mid-refresh"));
    register!(ADMIN_OPS, IntCounterVec::new(Opts::new("sticky_admin_ops_total", "Administrative operations"), &["op", "result"]));
    register!(PLATFORM_ERRORS, IntCounterVec::new(Opts::new("sticky_platform_errors_total", "Platform call failures"), &["call", "error"]));
    register!(STORE_WRITE_FAILURES, IntCounter::new("sticky_store_write_failures_total", "Failed sticky store flushes"));
    register!(GATEWAY_SESSIONS, IntCounter::new("sticky_gateway_sessions_total", "Gateway sessions started"));
    register!(COMMANDS, IntCounterVec::new(Opts::new("sticky_commands_total", "Text commands processed"), &["command", "result"]));
    register!(STICKIES_CONFIGURED, IntGauge::new("sticky_configured", "Sticky records currently configured"));
    register!(REFRESH_LATENCY, Histogram::with_opts(
        HistogramOpts::new("sticky_refresh_duration_seconds", "Refresh cycle duration")
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record the end of a refresh cycle.
#[inline]
pub fn record_refresh(outcome: &str, duration_secs: Option<f64>) {
    if let Some(c) = REFRESH_TOTAL.get() {
        c.with_label_values(&[outcome]).inc();
    }
    if let (Some(h), Some(secs)) = (REFRESH_LATENCY.get(), duration_secs) {
        h.observe(secs);
    }
}

#[inline]
pub fn record_trigger_dropped() {
    if let Some(c) = TRIGGERS_DROPPED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_admin(op: &str, result: &str) {
    if let Some(c) = ADMIN_OPS.get() {
        c.with_label_values(&[op, result]).inc();
    }
}

#[inline]
pub fn record_platform_error(call: &str, error: &str) {
    if let Some(c) = PLATFORM_ERRORS.get() {
        c.with_label_values(&[call, error]).inc();
    }
}

#[inline]
pub fn record_store_write_failure() {
    if let Some(c) = STORE_WRITE_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_gateway_session() {
    if let Some(c) = GATEWAY_SESSIONS.get() {
        c.inc();
    }
}

#[inline]
pub fn record_command(command: &str, result: &str) {
    if let Some(c) = COMMANDS.get() {
        c.with_label_values(&[command, result]).inc();
    }
}

#[inline]
pub fn set_stickies_configured(count: usize) {
    if let Some(g) = STICKIES_CONFIGURED.get() {
        g.set(count as i64);
    }
}
