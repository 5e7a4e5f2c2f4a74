//! Prediction gate - learned interval with a deterministic safety net
//!
//! The baseline always runs first and owns the model transition. A predictor,
//! when supplied and ready, may only replace the returned interval (and the
//! `next_review_at` derived from it). Predictor errors, timeouts and implausible
//! outputs degrade to the baseline; they are never surfaced to callers.

use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;

use super::baseline::BaselineScheduler;
use super::clock::{Clock, SystemClock};
use super::config::{GateConfig, SchedulerConfig};
use super::error::SchedulerError;
use super::features::FeatureExtractor;
use super::metrics::PredictionMetrics;
use super::predictor::{IntervalPredictor, RawPrediction};
use super::types::{IntervalSource, MemoryModel, PredictionResult, RejectionReason, ReviewEvent};

pub struct PredictionGate {
    baseline: BaselineScheduler,
    extractor: FeatureExtractor,
    config: GateConfig,
    metrics: Arc<PredictionMetrics>,
}

impl Default for PredictionGate {
    fn default() -> Self {
        Self::new(SchedulerConfig::default(), Arc::new(SystemClock))
    }
}

impl PredictionGate {
    pub fn new(config: SchedulerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            baseline: BaselineScheduler::new(config.baseline, clock),
            extractor: FeatureExtractor::new(config.features),
            config: config.gate,
            metrics: Arc::new(PredictionMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PredictionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn baseline(&self) -> &BaselineScheduler {
        &self.baseline
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<PredictionMetrics> {
        &self.metrics
    }

    pub async fn resolve_interval(
        &self,
        model: &MemoryModel,
        event: &ReviewEvent,
        predictor: Option<&dyn IntervalPredictor>,
    ) -> Result<PredictionResult, SchedulerError> {
        self.resolve_with_history(model, event, None, predictor)
            .await
    }

    pub async fn resolve_with_history(
        &self,
        model: &MemoryModel,
        event: &ReviewEvent,
        history: Option<&[ReviewEvent]>,
        predictor: Option<&dyn IntervalPredictor>,
    ) -> Result<PredictionResult, SchedulerError> {
        let (next_model, baseline_interval) = self.baseline.compute_next_interval(model, event)?;
        let mut result = PredictionResult::baseline(next_model, baseline_interval);

        let Some(predictor) = predictor else {
            self.metrics.record_baseline_only();
            return Ok(result);
        };

        if !predictor.is_ready() {
            self.reject(&mut result, RejectionReason::NotReady);
            return Ok(result);
        }

        let features = self.extractor.extract(model, event, history)?;

        match self.call_predictor(predictor, &features).await {
            Ok(raw) => match self.validate_prediction(model, raw.value) {
                Ok(interval) => {
                    if !self.accept(&mut result, interval, raw.confidence) {
                        self.reject(&mut result, RejectionReason::AboveMaximum);
                    }
                }
                Err(reason) => {
                    tracing::debug!(
                        prediction = raw.value,
                        total_reviews = model.total_reviews,
                        success_rate = model.success_rate(),
                        reason = ?reason,
                        "interval prediction rejected"
                    );
                    self.reject(&mut result, reason);
                }
            },
            Err(reason) => self.reject(&mut result, reason),
        }

        Ok(result)
    }

    async fn call_predictor(
        &self,
        predictor: &dyn IntervalPredictor,
        features: &[f64],
    ) -> Result<RawPrediction, RejectionReason> {
        let start = Instant::now();
        let outcome =
            tokio::time::timeout(self.config.predictor_timeout(), predictor.predict(features))
                .await;
        self.metrics
            .record_call(start.elapsed().as_micros() as u64);

        match outcome {
            Ok(Ok(Some(raw))) => Ok(raw),
            Ok(Ok(None)) => Err(RejectionReason::NoPrediction),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "interval predictor failed, using baseline");
                Err(RejectionReason::PredictorError)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.predictor_timeout_ms,
                    "interval predictor timed out, using baseline"
                );
                Err(RejectionReason::Timeout)
            }
        }
    }

    /// Checks a raw predictor output against the item's known performance.
    /// `model` is the state before the current review.
    pub fn validate_prediction(
        &self,
        model: &MemoryModel,
        prediction: f64,
    ) -> Result<u32, RejectionReason> {
        let c = &self.config;
        if !prediction.is_finite() {
            return Err(RejectionReason::NonFinite);
        }
        // A well-performing item getting a near-zero interval means the
        // predictor has drifted.
        if prediction < c.guard_min_prediction
            && model.total_reviews > c.guard_min_reviews
            && model.success_rate() > c.guard_min_success_rate
        {
            return Err(RejectionReason::PlausibilityGuard);
        }
        if prediction < c.min_interval_days {
            return Err(RejectionReason::BelowMinimum);
        }
        if prediction > c.max_interval_days {
            return Err(RejectionReason::AboveMaximum);
        }
        Ok((prediction.round() as u32).max(1))
    }

    /// Returns `false` when the interval cannot be placed on the calendar.
    fn accept(&self, result: &mut PredictionResult, interval: u32, confidence: Option<f64>) -> bool {
        let reviewed_at = result
            .model
            .last_reviewed_at
            .unwrap_or_else(|| self.baseline.now());
        let Some(next_review_at) = reviewed_at.checked_add_signed(Duration::days(interval as i64))
        else {
            return false;
        };

        tracing::debug!(
            ml_interval = interval,
            baseline_interval = result.baseline_interval,
            "using predicted interval"
        );

        result.interval = interval;
        result.source = IntervalSource::Ml;
        result.ml_interval = Some(interval);
        result.confidence = confidence.filter(|c| c.is_finite()).map(|c| c.clamp(0.0, 1.0));
        result.next_review_at = next_review_at;
        result.model.next_review_at = Some(next_review_at);
        self.metrics.record_accepted();
        true
    }

    fn reject(&self, result: &mut PredictionResult, reason: RejectionReason) {
        result.rejection = Some(reason);
        self.metrics.record_rejection(reason);
    }
}
