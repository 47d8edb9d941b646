//! Prometheus metrics for gate scans.
//!
//! [`ScanMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use std::time::Duration;

use gatewatch_access::{AccessError, ScanAction, ScanOutcome};
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::RpcError;

pub struct ScanMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    pub check_ins: IntCounter,
    pub check_outs: IntCounter,
    /// Scans of identities that did not resolve.
    pub breaches: IntCounter,
    /// Rejected scans, labelled by `reason` (the error code).
    pub denied: IntCounterVec,
    /// Scans that gave up waiting for the person's lock.
    pub contention: IntCounter,
    /// Wall time of a scan from request to decision, in seconds.
    pub scan_latency_seconds: Histogram,
}

impl ScanMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let check_ins = register_int_counter_with_registry!(
            Opts::new("gatewatch_check_ins_total", "Accepted check-in scans"),
            registry
        )?;
        let check_outs = register_int_counter_with_registry!(
            Opts::new("gatewatch_check_outs_total", "Accepted check-out scans"),
            registry
        )?;
        let breaches = register_int_counter_with_registry!(
            Opts::new(
                "gatewatch_breaches_total",
                "Scans of identities that could not be resolved"
            ),
            registry
        )?;
        let denied = register_int_counter_vec_with_registry!(
            Opts::new("gatewatch_scans_denied_total", "Rejected scans by reason"),
            &["reason"],
            registry
        )?;
        let contention = register_int_counter_with_registry!(
            Opts::new(
                "gatewatch_scan_contention_total",
                "Scans that timed out waiting for the person's lock"
            ),
            registry
        )?;
        let scan_latency_seconds = register_histogram_with_registry!(
            HistogramOpts::new("gatewatch_scan_latency_seconds", "Scan decision latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5]),
            registry
        )?;

        Ok(Self {
            registry,
            check_ins,
            check_outs,
            breaches,
            denied,
            contention,
            scan_latency_seconds,
        })
    }

    /// Count one scan decision.
    pub fn observe_scan(&self, result: &Result<ScanOutcome, AccessError>, elapsed: Duration) {
        self.scan_latency_seconds.observe(elapsed.as_secs_f64());
        match result {
            Ok(outcome) => match outcome.action {
                ScanAction::CheckIn => self.check_ins.inc(),
                ScanAction::CheckOut => self.check_outs.inc(),
            },
            Err(e) => {
                if matches!(e, AccessError::InvalidIdentity { .. }) {
                    self.breaches.inc();
                }
                if matches!(e, AccessError::Contention(_)) {
                    self.contention.inc();
                }
                if e.is_denial() {
                    self.denied.with_label_values(&[e.code()]).inc();
                }
            }
        }
    }

    /// Render every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, RpcError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| RpcError::Server(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewatch_types::{LocationId, PersonId};

    #[test]
    fn denials_are_labelled_by_reason() {
        let m = ScanMetrics::new().unwrap();
        let denied: Result<ScanOutcome, AccessError> =
            Err(AccessError::AccessDenied(PersonId::from("p")));
        let breach: Result<ScanOutcome, AccessError> = Err(AccessError::InvalidIdentity {
            location: LocationId::from("l"),
        });
        m.observe_scan(&denied, Duration::from_millis(3));
        m.observe_scan(&breach, Duration::from_millis(3));

        assert_eq!(m.denied.with_label_values(&["access_denied"]).get(), 1);
        assert_eq!(m.denied.with_label_values(&["invalid_identity"]).get(), 1);
        assert_eq!(m.breaches.get(), 1);
        assert_eq!(m.scan_latency_seconds.get_sample_count(), 2);

        let text = m.encode().unwrap();
        assert!(text.contains("gatewatch_breaches_total 1"));
    }

    #[test]
    fn contention_is_not_a_denial() {
        let m = ScanMetrics::new().unwrap();
        let r: Result<ScanOutcome, AccessError> = Err(AccessError::Contention(PersonId::from("p")));
        m.observe_scan(&r, Duration::ZERO);
        assert_eq!(m.contention.get(), 1);
        assert_eq!(m.denied.with_label_values(&["contention"]).get(), 0);
    }
}
