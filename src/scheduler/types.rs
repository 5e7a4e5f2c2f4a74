use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::{FeatureExtractionError, InvalidInputError};

pub const MIN_MEMORY_STRENGTH: f64 = 1.0;
pub const INITIAL_DIFFICULTY: f64 = 0.5;
pub const MAX_QUALITY: i32 = 5;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Per-item memory state. Replaced wholesale on every review, never mutated
/// in place by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredMemoryModel")]
pub struct MemoryModel {
    pub memory_strength: f64,
    pub difficulty_rating: f64,
    pub total_reviews: u32,
    pub total_correct: u32,
    pub consecutive_correct: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub average_response_time: f64,
}

/// Persisted shape. Rows written before `totalCorrect` existed carry only the
/// streak, which is the best known lower bound for the lifetime count.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMemoryModel {
    memory_strength: f64,
    difficulty_rating: f64,
    total_reviews: u32,
    total_correct: Option<u32>,
    consecutive_correct: u32,
    last_reviewed_at: Option<DateTime<Utc>>,
    next_review_at: Option<DateTime<Utc>>,
    average_response_time: f64,
}

impl From<StoredMemoryModel> for MemoryModel {
    fn from(stored: StoredMemoryModel) -> Self {
        let total_correct = stored
            .total_correct
            .unwrap_or_else(|| stored.consecutive_correct.min(stored.total_reviews));
        Self {
            memory_strength: stored.memory_strength,
            difficulty_rating: stored.difficulty_rating,
            total_reviews: stored.total_reviews,
            total_correct,
            consecutive_correct: stored.consecutive_correct,
            last_reviewed_at: stored.last_reviewed_at,
            next_review_at: stored.next_review_at,
            average_response_time: stored.average_response_time,
        }
    }
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self {
            memory_strength: MIN_MEMORY_STRENGTH,
            difficulty_rating: INITIAL_DIFFICULTY,
            total_reviews: 0,
            total_correct: 0,
            consecutive_correct: 0,
            last_reviewed_at: None,
            next_review_at: None,
            average_response_time: 0.0,
        }
    }
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self) -> bool {
        self.total_reviews == 0
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_reviews == 0 {
            return 0.0;
        }
        self.total_correct as f64 / self.total_reviews as f64
    }

    /// Fractional days between the last review and `at`. Zero for new items
    /// and for clocks that run backwards.
    pub fn days_since_last_review(&self, at: DateTime<Utc>) -> f64 {
        match self.last_reviewed_at {
            Some(last) => ((at - last).num_milliseconds() as f64 / MS_PER_DAY).max(0.0),
            None => 0.0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_at {
            Some(next) => next <= now,
            None => true,
        }
    }

    pub fn validate(&self) -> Result<(), FeatureExtractionError> {
        if !self.memory_strength.is_finite() || self.memory_strength < MIN_MEMORY_STRENGTH {
            return Err(FeatureExtractionError::InvalidField {
                field: "memoryStrength",
                value: self.memory_strength,
            });
        }
        if !(0.0..=1.0).contains(&self.difficulty_rating) {
            return Err(FeatureExtractionError::InvalidField {
                field: "difficultyRating",
                value: self.difficulty_rating,
            });
        }
        if !self.average_response_time.is_finite() || self.average_response_time < 0.0 {
            return Err(FeatureExtractionError::InvalidField {
                field: "averageResponseTime",
                value: self.average_response_time,
            });
        }
        if self.total_correct > self.total_reviews {
            return Err(FeatureExtractionError::InconsistentCounters(format!(
                "totalCorrect {} exceeds totalReviews {}",
                self.total_correct, self.total_reviews
            )));
        }
        if self.consecutive_correct > self.total_correct {
            return Err(FeatureExtractionError::InconsistentCounters(format!(
                "consecutiveCorrect {} exceeds totalCorrect {}",
                self.consecutive_correct, self.total_correct
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    pub correct: bool,
    pub quality: i32,
    pub response_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

impl ReviewEvent {
    pub fn new(correct: bool, quality: i32, response_time_ms: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            correct,
            quality,
            response_time_ms,
            timestamp,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if !(0..=MAX_QUALITY).contains(&self.quality) {
            return Err(InvalidInputError::QualityOutOfRange {
                quality: self.quality,
            });
        }
        if !self.response_time_ms.is_finite() {
            return Err(InvalidInputError::NonFiniteResponseTime);
        }
        if self.response_time_ms < 0.0 {
            return Err(InvalidInputError::NegativeResponseTime(self.response_time_ms));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalSource {
    Baseline,
    Ml,
}

impl IntervalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Ml => "ml",
        }
    }
}

/// Why a predictor output was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NotReady,
    NoPrediction,
    PredictorError,
    Timeout,
    NonFinite,
    PlausibilityGuard,
    BelowMinimum,
    AboveMaximum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub interval: u32,
    pub source: IntervalSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub baseline_interval: u32,
    pub ml_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionReason>,
    pub next_review_at: DateTime<Utc>,
    pub model: MemoryModel,
}

impl PredictionResult {
    pub fn baseline(model: MemoryModel, interval: u32) -> Self {
        let next_review_at = model.next_review_at.unwrap_or_else(|| {
            let reviewed_at = model.last_reviewed_at.unwrap_or_default();
            reviewed_at
                .checked_add_signed(Duration::days(interval as i64))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        Self {
            interval,
            source: IntervalSource::Baseline,
            confidence: None,
            baseline_interval: interval,
            ml_interval: None,
            rejection: None,
            next_review_at,
            model,
        }
    }

    pub fn is_ml(&self) -> bool {
        self.source == IntervalSource::Ml
    }
}
