//! ---
//! ra_section: "02-security-access-control"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Roles, authorization decisions, identity, and session handling."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::sync::Arc;

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

use crate::authorizer::ReasonCode;

/// Sign-in and authorization counters exported via Prometheus.
#[derive(Clone)]
pub struct SecurityMetrics {
    registry: Arc<Registry>,
    sign_in_attempts_total: IntCounter,
    sign_in_failures_total: IntCounter,
    authorization_denials_total: IntCounterVec,
}

impl SecurityMetrics {
    /// Register metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> anyhow::Result<Self> {
        let sign_in_attempts_total = IntCounter::new(
            "ruang_arsip_sign_in_attempts_total",
            "Total sign-in attempts",
        )?;
        let sign_in_failures_total = IntCounter::new(
            "ruang_arsip_sign_in_failures_total",
            "Rejected sign-in attempts",
        )?;
        let authorization_denials_total = IntCounterVec::new(
            Opts::new(
                "ruang_arsip_authorization_denials_total",
                "Route and action denials by reason code",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(sign_in_attempts_total.clone()))?;
        registry.register(Box::new(sign_in_failures_total.clone()))?;
        registry.register(Box::new(authorization_denials_total.clone()))?;

        Ok(Self {
            registry,
            sign_in_attempts_total,
            sign_in_failures_total,
            authorization_denials_total,
        })
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Increment sign-in attempts.
    pub fn inc_sign_in_attempt(&self) {
        self.sign_in_attempts_total.inc();
    }

    /// Increment sign-in failures.
    pub fn inc_sign_in_failure(&self) {
        self.sign_in_failures_total.inc();
    }

    /// Count a denial under its reason label.
    pub fn inc_denial(&self, reason: ReasonCode) {
        self.authorization_denials_total
            .with_label_values(&[reason.as_ref()])
            .inc();
    }

    /// Current denial count for a reason.
    pub fn denials(&self, reason: ReasonCode) -> u64 {
        self.authorization_denials_total
            .with_label_values(&[reason.as_ref()])
            .get()
    }
}
