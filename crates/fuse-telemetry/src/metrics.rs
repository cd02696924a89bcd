//! Prometheus counters for the reconciliation pipeline.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error that should crash at
//! first use rather than silently drop data.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

/// Events dispatched to a handler.
/// Labels: event
pub static EVENTS_PROCESSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fuse_events_processed_total",
        "Total chain events dispatched to a handler",
        &["event"]
    )
    .unwrap()
});

/// Events whose mutation was skipped.
/// Labels: event, reason (unknown_market/unknown_pool/...)
pub static EVENTS_SKIPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fuse_events_skipped_total",
        "Total chain events skipped without mutation",
        &["event", "reason"]
    )
    .unwrap()
});

/// Contract reads that reverted or returned undecodable data.
pub static CALLS_REVERTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fuse_calls_reverted_total",
        "Total contract calls that reverted",
        &["method"]
    )
    .unwrap()
});

pub static ENTITIES_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fuse_entities_created_total",
        "Total entities created",
        &["kind"]
    )
    .unwrap()
});

/// Price resolutions that fell back to the documented default.
pub static PRICE_FALLBACK_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fuse_price_fallback_total",
        "Total price resolutions that used a fallback value",
        &["reason"]
    )
    .unwrap()
});

/// Market reconciliation outcomes.
/// Labels: outcome (applied/current)
pub static MARKET_UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "fuse_market_updates_total",
        "Total market update requests by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Metrics recording facade.
pub struct Metrics;

impl Metrics {
    pub fn event_processed(event: &str) {
        EVENTS_PROCESSED_TOTAL.with_label_values(&[event]).inc();
    }

    pub fn event_skipped(event: &str, reason: &str) {
        EVENTS_SKIPPED_TOTAL
            .with_label_values(&[event, reason])
            .inc();
    }

    pub fn call_reverted(method: &str) {
        CALLS_REVERTED_TOTAL.with_label_values(&[method]).inc();
    }

    pub fn entity_created(kind: &str) {
        ENTITIES_CREATED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn price_fallback(reason: &str) {
        PRICE_FALLBACK_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a market update. `applied` is false when the idempotence
    /// guard short-circuited.
    pub fn market_update(applied: bool) {
        let outcome = if applied { "applied" } else { "current" };
        MARKET_UPDATES_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let families = prometheus::gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
