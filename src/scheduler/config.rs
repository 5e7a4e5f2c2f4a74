use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound for any scheduled interval, in days.
pub const MAX_INTERVAL_DAYS: f64 = 36500.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineParams {
    pub ease_max: f64,
    pub ease_min: f64,
    pub failure_penalty: f64,
    pub quality_step: f64,
    pub max_interval_days: f64,
}

impl Default for BaselineParams {
    fn default() -> Self {
        Self {
            ease_max: 2.5,
            ease_min: 1.3,
            failure_penalty: 0.15,
            quality_step: 0.02,
            max_interval_days: MAX_INTERVAL_DAYS,
        }
    }
}

/// Thresholds applied to predictor output before it may replace the
/// baseline interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub predictor_timeout_ms: u64,
    pub min_interval_days: f64,
    pub max_interval_days: f64,
    pub guard_min_prediction: f64,
    pub guard_min_reviews: u32,
    pub guard_min_success_rate: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            predictor_timeout_ms: 2000,
            min_interval_days: 1.0,
            max_interval_days: MAX_INTERVAL_DAYS,
            guard_min_prediction: 0.5,
            guard_min_reviews: 10,
            guard_min_success_rate: 0.8,
        }
    }
}

impl GateConfig {
    pub fn predictor_timeout(&self) -> Duration {
        Duration::from_millis(self.predictor_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureLayout {
    #[default]
    Base,
    Extended,
}

impl FeatureLayout {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "extended" => Self::Extended,
            _ => Self::Base,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub layout: FeatureLayout,
    pub history_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            layout: FeatureLayout::Base,
            history_window: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub baseline: BaselineParams,
    pub gate: GateConfig,
    pub features: FeatureConfig,
}

impl SchedulerConfig {
    /// Sets the interval cap for both the baseline and accepted predictions,
    /// clamped to `[1, MAX_INTERVAL_DAYS]`. Non-finite input is ignored.
    pub fn set_max_interval_days(&mut self, days: f64) {
        if !days.is_finite() {
            return;
        }
        let days = days.clamp(1.0, MAX_INTERVAL_DAYS);
        self.baseline.max_interval_days = days;
        self.gate.max_interval_days = days;
    }

    pub fn with_max_interval_days(mut self, days: f64) -> Self {
        self.set_max_interval_days(days);
        self
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse::<u64>("RECALL_PREDICTOR_TIMEOUT_MS") {
            config.gate.predictor_timeout_ms = val;
        }
        if let Some(val) = env_parse::<f64>("RECALL_GUARD_MIN_PREDICTION") {
            config.gate.guard_min_prediction = val;
        }
        if let Some(val) = env_parse::<u32>("RECALL_GUARD_MIN_REVIEWS") {
            config.gate.guard_min_reviews = val;
        }
        if let Some(val) = env_parse::<f64>("RECALL_GUARD_MIN_SUCCESS_RATE") {
            config.gate.guard_min_success_rate = val;
        }
        if let Some(val) = env_parse::<f64>("RECALL_MAX_INTERVAL_DAYS") {
            config.set_max_interval_days(val);
        }
        if let Some(val) = env_parse::<f64>("RECALL_FAILURE_PENALTY") {
            config.baseline.failure_penalty = val.clamp(0.0, 1.0);
        }
        if let Some(val) = env_parse::<f64>("RECALL_QUALITY_STEP") {
            config.baseline.quality_step = val.clamp(0.0, 0.2);
        }
        if let Ok(val) = std::env::var("RECALL_FEATURE_LAYOUT") {
            config.features.layout = FeatureLayout::parse(&val);
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
