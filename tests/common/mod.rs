#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use recall_engine::scheduler::{
    FixedClock, IntervalPredictor, MemoryModel, PredictionGate, PredictorError, RawPrediction,
    ReviewEvent, SchedulerConfig,
};

pub const FIXED_TIMESTAMP: i64 = 1_700_000_000_000;

pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(FIXED_TIMESTAMP).unwrap()
}

pub fn test_gate(config: SchedulerConfig) -> PredictionGate {
    PredictionGate::new(config, Arc::new(FixedClock::from_timestamp_ms(FIXED_TIMESTAMP)))
}

pub fn sample_event(correct: bool, quality: i32) -> ReviewEvent {
    ReviewEvent::new(correct, quality, 2500.0, fixed_now())
}

/// 20 reviews at 90% success.
pub fn well_known_model() -> MemoryModel {
    MemoryModel {
        memory_strength: 15.0,
        difficulty_rating: 0.25,
        total_reviews: 20,
        total_correct: 18,
        consecutive_correct: 9,
        last_reviewed_at: Some(fixed_now() - chrono::Duration::days(15)),
        next_review_at: Some(fixed_now()),
        average_response_time: 1800.0,
    }
}

pub struct FixedPredictor {
    pub value: Option<f64>,
    pub confidence: Option<f64>,
    pub ready: bool,
    pub calls: AtomicUsize,
}

impl FixedPredictor {
    pub fn new(value: Option<f64>) -> Self {
        Self {
            value,
            confidence: None,
            ready: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn not_ready(value: f64) -> Self {
        Self {
            ready: false,
            ..Self::new(Some(value))
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntervalPredictor for FixedPredictor {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn predict(&self, _features: &[f64]) -> Result<Option<RawPrediction>, PredictorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.map(|value| RawPrediction {
            value,
            confidence: self.confidence,
        }))
    }
}

pub struct SlowPredictor {
    pub delay: Duration,
}

#[async_trait]
impl IntervalPredictor for SlowPredictor {
    fn is_ready(&self) -> bool {
        true
    }

    async fn predict(&self, _features: &[f64]) -> Result<Option<RawPrediction>, PredictorError> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(RawPrediction::from(12.0)))
    }
}
