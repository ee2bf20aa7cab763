//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the engine.
//!
//! # Metrics
//!
//! - `multisig_wallets_created_total` - Wallets created
//! - `multisig_transactions_submitted_total` - Transactions submitted
//! - `multisig_approvals_recorded_total` - Approvals recorded (implicit ones included)
//! - `multisig_quorum_reached_total` - Pending -> ReadyToExecute transitions
//! - `multisig_rejections_total{kind}` - Rejected operations by error kind
//! - `multisig_approval_duration_seconds` - Approval latency, lock wait included

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Wallets created
    pub wallets_created: IntCounter,

    /// Transactions submitted
    pub transactions_submitted: IntCounter,

    /// Approvals recorded
    pub approvals_recorded: IntCounter,

    /// Quorum transitions
    pub quorum_reached: IntCounter,

    /// Rejections by error kind
    pub rejections: IntCounterVec,

    /// Approval duration histogram
    pub approval_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let wallets_created =
            IntCounter::new("multisig_wallets_created_total", "Wallets created")?;
        registry.register(Box::new(wallets_created.clone()))?;

        let transactions_submitted = IntCounter::new(
            "multisig_transactions_submitted_total",
            "Transactions submitted",
        )?;
        registry.register(Box::new(transactions_submitted.clone()))?;

        let approvals_recorded =
            IntCounter::new("multisig_approvals_recorded_total", "Approvals recorded")?;
        registry.register(Box::new(approvals_recorded.clone()))?;

        let quorum_reached = IntCounter::new(
            "multisig_quorum_reached_total",
            "Transactions that reached their approval threshold",
        )?;
        registry.register(Box::new(quorum_reached.clone()))?;

        let rejections = IntCounterVec::new(
            Opts::new("multisig_rejections_total", "Rejected operations by error kind"),
            &["kind"],
        )?;
        registry.register(Box::new(rejections.clone()))?;

        let approval_duration = Histogram::with_opts(
            HistogramOpts::new(
                "multisig_approval_duration_seconds",
                "Histogram of approval latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
        )?;
        registry.register(Box::new(approval_duration.clone()))?;

        Ok(Self {
            wallets_created,
            transactions_submitted,
            approvals_recorded,
            quorum_reached,
            rejections,
            approval_duration,
            registry,
        })
    }

    /// Record wallet creation
    pub fn record_wallet_created(&self) {
        self.wallets_created.inc();
    }

    /// Record transaction submission
    pub fn record_transaction_submitted(&self) {
        self.transactions_submitted.inc();
    }

    /// Record an approval and whether it completed the quorum
    pub fn record_approval(&self, reached_quorum: bool) {
        self.approvals_recorded.inc();
        if reached_quorum {
            self.quorum_reached.inc();
        }
    }

    /// Record a rejected operation
    pub fn record_rejection(&self, kind: &str) {
        self.rejections.with_label_values(&[kind]).inc();
    }

    /// Record approval duration
    pub fn record_approval_duration(&self, duration_seconds: f64) {
        self.approval_duration.observe(duration_seconds);
    }

    /// Text exposition of every registered metric
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("wallets_created", &self.wallets_created.get())
            .field("transactions_submitted", &self.transactions_submitted.get())
            .field("approvals_recorded", &self.approvals_recorded.get())
            .field("quorum_reached", &self.quorum_reached.get())
            .finish()
    }
}
