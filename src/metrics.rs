// Prometheus metrics definitions for the CoachGrind backend.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    /// Total external-model calls, by operation (analyze, generate, counters).
    pub static ref MODEL_CALLS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("coachgrind_model_calls_total", "Total external model calls"),
        &["operation"],
    )
    .unwrap();

    /// Total external-model calls that failed or returned unusable output.
    pub static ref MODEL_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("coachgrind_model_failures_total", "Failed external model calls"),
        &["operation"],
    )
    .unwrap();

    /// Analyses served from the static default instead of the model.
    pub static ref ANALYSIS_FALLBACKS_TOTAL: IntCounter = IntCounter::new(
        "coachgrind_analysis_fallbacks_total",
        "Analyses served from the static default",
    )
    .unwrap();

    /// Total sessions issued (signup + login).
    pub static ref SESSIONS_ISSUED_TOTAL: IntCounter = IntCounter::new(
        "coachgrind_sessions_issued_total",
        "Sessions issued",
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MODEL_CALLS_TOTAL.clone()),
        Box::new(MODEL_FAILURES_TOTAL.clone()),
        Box::new(ANALYSIS_FALLBACKS_TOTAL.clone()),
        Box::new(SESSIONS_ISSUED_TOTAL.clone()),
    ];

    for c in collectors {
        REGISTRY.register(c).expect("failed to register metric");
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = MODEL_CALLS_TOTAL.with_label_values(&["analyze"]).get();
        MODEL_CALLS_TOTAL.with_label_values(&["analyze"]).inc();
        assert_eq!(
            MODEL_CALLS_TOTAL.with_label_values(&["analyze"]).get(),
            before + 1
        );
    }
}
