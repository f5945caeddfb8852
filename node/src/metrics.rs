//! Prometheus metrics for the attendance engine.
//!
//! Exposes counters, gauges, and a histogram covering the beacon, presence
//! classification, proof round trips, and attendance verdicts.  The
//! [`EngineMetrics`] struct owns a dedicated [`Registry`] that the status
//! server's `/metrics` endpoint encodes into the Prometheus text exposition
//! format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::NodeError;

/// Central collection of all engine-level Prometheus metrics.
pub struct EngineMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Nonce rotations performed by the local beacon.
    pub beacon_rotations: IntCounter,
    /// Advertisements handed to the scanner.
    pub advertisements_observed: IntCounter,
    /// Nonce-observed events (new nonces only).
    pub nonces_observed: IntCounter,
    /// Windows that produced a label.
    pub windows_classified: IntCounter,
    /// Windows rejected by the variance gate without consulting the model.
    pub windows_gated: IntCounter,
    /// Windows on which the model failed.
    pub classifier_failures: IntCounter,
    pub proofs_requested: IntCounter,
    pub proofs_confirmed: IntCounter,
    pub proofs_invalid: IntCounter,
    pub proofs_failed: IntCounter,
    /// Attendance verdicts reached.
    pub verdicts: IntCounter,
    /// Verdicts that could not be persisted.
    pub record_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// 1 while the smoothed presence state is "with user".
    pub presence_with_user: IntGauge,
    /// 1 while a matching beacon has been seen recently.
    pub in_range: IntGauge,
    /// Proof round trips currently in flight.
    pub proofs_in_flight: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Prove-then-verify latency, in milliseconds.
    pub proof_latency_ms: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
        .unwrap_or_else(|e| panic!("failed to register {name}: {e}"))
}

fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
    register_int_gauge_with_registry!(Opts::new(name, help), registry)
        .unwrap_or_else(|e| panic!("failed to register {name}: {e}"))
}

impl EngineMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();
        let r = &registry;

        // Counters
        let beacon_rotations = counter(
            r,
            "proxima_beacon_rotations_total",
            "Nonce rotations by the local beacon",
        );
        let advertisements_observed = counter(
            r,
            "proxima_advertisements_observed_total",
            "Advertisements seen by the scanner",
        );
        let nonces_observed = counter(
            r,
            "proxima_nonces_observed_total",
            "New nonces emitted by the scanner",
        );
        let windows_classified = counter(
            r,
            "proxima_windows_classified_total",
            "Motion windows that produced a presence label",
        );
        let windows_gated = counter(
            r,
            "proxima_windows_gated_total",
            "Motion windows rejected by the variance gate",
        );
        let classifier_failures = counter(
            r,
            "proxima_classifier_failures_total",
            "Motion windows on which the presence model failed",
        );
        let proofs_requested = counter(
            r,
            "proxima_proofs_requested_total",
            "Proof round trips started",
        );
        let proofs_confirmed = counter(r, "proxima_proofs_confirmed_total", "Proofs verified");
        let proofs_invalid = counter(
            r,
            "proxima_proofs_invalid_total",
            "Proofs rejected by the verifier",
        );
        let proofs_failed = counter(
            r,
            "proxima_proofs_failed_total",
            "Proof round trips that failed in transport or decoding",
        );
        let verdicts = counter(r, "proxima_verdicts_total", "Attendance verdicts reached");
        let record_failures = counter(
            r,
            "proxima_record_failures_total",
            "Attendance records that could not be written",
        );

        // Gauges
        let presence_with_user = gauge(
            r,
            "proxima_presence_with_user",
            "1 while the device is with its user",
        );
        let in_range = gauge(r, "proxima_in_range", "1 while a matching beacon was seen recently");
        let proofs_in_flight = gauge(r, "proxima_proofs_in_flight", "Proof round trips in flight");

        // Histogram – exponential buckets covering 5 ms → ~40 s.
        let buckets = prometheus::exponential_buckets(5.0, 2.0, 14)
            .unwrap_or_else(|e| panic!("invalid proof latency buckets: {e}"));
        let proof_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "proxima_proof_latency_ms",
                "Proof round-trip latency in milliseconds"
            )
            .buckets(buckets),
            registry
        )
        .unwrap_or_else(|e| panic!("failed to register proxima_proof_latency_ms: {e}"));

        Self {
            registry,
            beacon_rotations,
            advertisements_observed,
            nonces_observed,
            windows_classified,
            windows_gated,
            classifier_failures,
            proofs_requested,
            proofs_confirmed,
            proofs_invalid,
            proofs_failed,
            verdicts,
            record_failures,
            presence_with_user,
            in_range,
            proofs_in_flight,
            proof_latency_ms,
        }
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| NodeError::StatusServer(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| NodeError::StatusServer(e.to_string()))
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
