use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::types::RejectionReason;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionMetricsSnapshot {
    pub total_predictions: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub baseline_only: u64,
    pub total_prediction_us: u64,
    pub avg_prediction_time_ms: f64,
}

/// Lock-free counters for predictor traffic through the gate.
#[derive(Debug, Default)]
pub struct PredictionMetrics {
    total_predictions: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    baseline_only: AtomicU64,
    total_prediction_us: AtomicU64,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A predictor call completed (successfully or not) after `latency_us`.
    pub fn record_call(&self, latency_us: u64) {
        self.total_predictions.fetch_add(1, Ordering::Relaxed);
        self.total_prediction_us
            .fetch_add(latency_us, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, reason: RejectionReason) {
        match reason {
            RejectionReason::NotReady => {
                self.baseline_only.fetch_add(1, Ordering::Relaxed);
            }
            RejectionReason::PredictorError => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            RejectionReason::Timeout => {
                self.timed_out.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_baseline_only(&self) {
        self.baseline_only.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_prediction_time_ms(&self) -> f64 {
        let calls = self.total_predictions.load(Ordering::Relaxed);
        if calls == 0 {
            return 0.0;
        }
        let total_us = self.total_prediction_us.load(Ordering::Relaxed);
        let avg = (total_us as f64 / calls as f64) / 1000.0;
        (avg * 10000.0).round() / 10000.0
    }

    pub fn snapshot(&self) -> PredictionMetricsSnapshot {
        PredictionMetricsSnapshot {
            total_predictions: self.total_predictions.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            baseline_only: self.baseline_only.load(Ordering::Relaxed),
            total_prediction_us: self.total_prediction_us.load(Ordering::Relaxed),
            avg_prediction_time_ms: self.avg_prediction_time_ms(),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_predictions,
            &self.accepted,
            &self.rejected,
            &self.failed,
            &self.timed_out,
            &self.baseline_only,
            &self.total_prediction_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
