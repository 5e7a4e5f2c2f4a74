//! Baseline scheduler - SM-2 family state transition
//!
//! The only place a `MemoryModel` is advanced. Every other component either
//! reads the model or forwards the value produced here.
//!
//! - Incorrect: interval 1, strength reset to 1, streak reset, difficulty raised
//! - Correct: interval = round(strength * ease), ease derived from difficulty
//!   with a floor of `ease_min`; difficulty lowered in proportion to quality
//!
//! Intervals are capped at `max_interval_days`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::config::BaselineParams;
use super::error::InvalidInputError;
use super::types::{MemoryModel, ReviewEvent, MIN_MEMORY_STRENGTH};

/// Intervals the baseline would hand out for a failed and a passed review.
/// Quality only moves difficulty, so every passing grade shares `pass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalPreview {
    pub again: u32,
    pub pass: u32,
}

#[derive(Clone)]
pub struct BaselineScheduler {
    params: BaselineParams,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for BaselineScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaselineScheduler")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Default for BaselineScheduler {
    fn default() -> Self {
        Self::new(BaselineParams::default(), Arc::new(SystemClock))
    }
}

impl BaselineScheduler {
    pub fn new(params: BaselineParams, clock: Arc<dyn Clock>) -> Self {
        Self { params, clock }
    }

    pub fn params(&self) -> &BaselineParams {
        &self.params
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn ease_factor(&self, difficulty: f64) -> f64 {
        let p = &self.params;
        let d = difficulty.clamp(0.0, 1.0);
        (p.ease_max - (p.ease_max - p.ease_min) * d).max(p.ease_min)
    }

    pub fn compute_next_interval(
        &self,
        model: &MemoryModel,
        event: &ReviewEvent,
    ) -> Result<(MemoryModel, u32), InvalidInputError> {
        event.validate()?;
        Ok(self.apply_at(model, event, self.clock.now()))
    }

    fn apply_at(
        &self,
        model: &MemoryModel,
        event: &ReviewEvent,
        now: DateTime<Utc>,
    ) -> (MemoryModel, u32) {
        let p = &self.params;
        let mut next = model.clone();
        let strength = model.memory_strength.max(MIN_MEMORY_STRENGTH);

        let interval = if event.correct {
            let ease = self.ease_factor(model.difficulty_rating);
            let interval = (strength * ease).round().clamp(1.0, p.max_interval_days) as u32;
            next.memory_strength = (interval as f64).max(strength);
            next.consecutive_correct = model.consecutive_correct.saturating_add(1);
            next.total_correct = model.total_correct.saturating_add(1);
            let relief = p.quality_step * event.quality as f64;
            next.difficulty_rating = (model.difficulty_rating - relief).clamp(0.0, 1.0);
            interval
        } else {
            next.memory_strength = MIN_MEMORY_STRENGTH;
            next.consecutive_correct = 0;
            next.difficulty_rating =
                (model.difficulty_rating + p.failure_penalty).clamp(0.0, 1.0);
            1
        };

        let reviews = model.total_reviews.saturating_add(1);
        next.average_response_time = model.average_response_time
            + (event.response_time_ms - model.average_response_time) / reviews as f64;
        next.total_reviews = reviews;
        next.last_reviewed_at = Some(now);
        next.next_review_at = Some(
            now.checked_add_signed(Duration::days(interval as i64))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );

        (next, interval)
    }

    /// Interval preview for "what happens if" displays.
    pub fn preview(&self, model: &MemoryModel, at: DateTime<Utc>) -> IntervalPreview {
        let probe = |correct: bool, quality: i32| {
            let event = ReviewEvent::new(correct, quality, model.average_response_time, at);
            self.apply_at(model, &event, at).1
        };
        IntervalPreview {
            again: probe(false, 1),
            pass: probe(true, 4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::clock::FixedClock;

    const FIXED_TIMESTAMP: i64 = 1_700_000_000_000;

    fn scheduler() -> BaselineScheduler {
        BaselineScheduler::new(
            BaselineParams::default(),
            Arc::new(FixedClock::from_timestamp_ms(FIXED_TIMESTAMP)),
        )
    }

    fn event(correct: bool, quality: i32) -> ReviewEvent {
        ReviewEvent::new(
            correct,
            quality,
            2000.0,
            DateTime::from_timestamp_millis(FIXED_TIMESTAMP).unwrap(),
        )
    }

    #[test]
    fn test_ease_factor_bounds() {
        let s = scheduler();
        assert!((s.ease_factor(0.0) - 2.5).abs() < 1e-9);
        assert!((s.ease_factor(1.0) - 1.3).abs() < 1e-9);
        assert!((s.ease_factor(5.0) - 1.3).abs() < 1e-9);
        assert!(s.ease_factor(0.2) > s.ease_factor(0.8));
    }

    #[test]
    fn test_correct_answer_grows_strength() {
        let s = scheduler();
        let model = MemoryModel {
            memory_strength: 10.0,
            difficulty_rating: 0.0,
            total_reviews: 5,
            total_correct: 5,
            consecutive_correct: 5,
            ..Default::default()
        };
        let (next, interval) = s.compute_next_interval(&model, &event(true, 4)).unwrap();
        assert_eq!(interval, 25);
        assert_eq!(next.memory_strength, 25.0);
        assert_eq!(next.consecutive_correct, 6);
        assert_eq!(next.total_correct, 6);
        assert_eq!(next.total_reviews, 6);
        assert!(next.difficulty_rating <= model.difficulty_rating);
    }

    #[test]
    fn test_higher_quality_lowers_difficulty_more() {
        let s = scheduler();
        let model = MemoryModel::new();
        let (q3, _) = s.compute_next_interval(&model, &event(true, 3)).unwrap();
        let (q5, _) = s.compute_next_interval(&model, &event(true, 5)).unwrap();
        assert!(q5.difficulty_rating < q3.difficulty_rating);
    }

    #[test]
    fn test_incorrect_resets() {
        let s = scheduler();
        let model = MemoryModel {
            memory_strength: 40.0,
            difficulty_rating: 0.95,
            total_reviews: 8,
            total_correct: 7,
            consecutive_correct: 7,
            ..Default::default()
        };
        let (next, interval) = s.compute_next_interval(&model, &event(false, 1)).unwrap();
        assert_eq!(interval, 1);
        assert_eq!(next.memory_strength, 1.0);
        assert_eq!(next.consecutive_correct, 0);
        assert_eq!(next.total_correct, 7);
        assert_eq!(next.difficulty_rating, 1.0);
    }

    #[test]
    fn test_timestamps_follow_clock() {
        let s = scheduler();
        let (next, interval) = s
            .compute_next_interval(&MemoryModel::new(), &event(true, 4))
            .unwrap();
        let now = DateTime::from_timestamp_millis(FIXED_TIMESTAMP).unwrap();
        assert_eq!(next.last_reviewed_at, Some(now));
        assert_eq!(
            next.next_review_at,
            Some(now + Duration::days(interval as i64))
        );
    }

    #[test]
    fn test_running_mean_response_time() {
        let s = scheduler();
        let mut model = MemoryModel::new();
        for rt in [1000.0, 2000.0, 3000.0] {
            let mut e = event(true, 4);
            e.response_time_ms = rt;
            model = s.compute_next_interval(&model, &e).unwrap().0;
        }
        assert!((model.average_response_time - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_quality_leaves_model_untouched() {
        let s = scheduler();
        let model = MemoryModel {
            memory_strength: 6.0,
            total_reviews: 3,
            total_correct: 3,
            consecutive_correct: 3,
            ..Default::default()
        };
        let before = model.clone();
        let err = s.compute_next_interval(&model, &event(true, 6)).unwrap_err();
        assert_eq!(err, InvalidInputError::QualityOutOfRange { quality: 6 });
        assert_eq!(model, before);
    }

    #[test]
    fn test_fractional_strength_never_shrinks_on_success() {
        let s = scheduler();
        let model = MemoryModel {
            memory_strength: 1.1,
            difficulty_rating: 1.0,
            ..Default::default()
        };
        let (next, interval) = s.compute_next_interval(&model, &event(true, 3)).unwrap();
        assert_eq!(interval, 1);
        assert!(next.memory_strength >= 1.1);
    }

    #[test]
    fn test_interval_is_capped() {
        let s = scheduler();
        let model = MemoryModel {
            memory_strength: 30_000.0,
            difficulty_rating: 0.0,
            total_reviews: 20,
            total_correct: 20,
            consecutive_correct: 20,
            ..Default::default()
        };
        let (next, interval) = s.compute_next_interval(&model, &event(true, 5)).unwrap();
        assert_eq!(interval, 36_500);
        assert_eq!(next.memory_strength, 36_500.0);
    }

    #[test]
    fn test_preview() {
        let s = scheduler();
        let model = MemoryModel {
            memory_strength: 4.0,
            difficulty_rating: 0.5,
            total_reviews: 3,
            total_correct: 3,
            consecutive_correct: 3,
            ..Default::default()
        };
        let at = DateTime::from_timestamp_millis(FIXED_TIMESTAMP).unwrap();
        let preview = s.preview(&model, at);
        assert_eq!(preview.again, 1);
        assert_eq!(preview.pass, 8);

        for quality in 3..=5 {
            let e = ReviewEvent::new(true, quality, 2000.0, at);
            assert_eq!(s.apply_at(&model, &e, at).1, preview.pass);
        }
    }

    #[test]
    fn test_oversized_cap_does_not_overflow_dates() {
        let params = BaselineParams {
            max_interval_days: 1e12,
            ..Default::default()
        };
        let s = BaselineScheduler::new(
            params,
            Arc::new(FixedClock::from_timestamp_ms(FIXED_TIMESTAMP)),
        );
        let model = MemoryModel {
            memory_strength: 1e11,
            difficulty_rating: 0.0,
            ..Default::default()
        };
        let (next, interval) = s.compute_next_interval(&model, &event(true, 4)).unwrap();
        assert_eq!(interval, u32::MAX);
        assert_eq!(next.next_review_at, Some(DateTime::<Utc>::MAX_UTC));
    }
}
