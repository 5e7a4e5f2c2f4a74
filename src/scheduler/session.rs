use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::ReviewEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub attempted: u32,
    pub correct: u32,
    pub streak: u32,
    #[serde(default)]
    pub best_streak: u32,
}

impl SessionStats {
    pub fn accuracy(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.correct as f64 / self.attempted as f64
    }
}

/// Session-scoped answer counters. All-time aggregation belongs to whatever
/// persists `MemoryModel`s.
#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    stats: SessionStats,
    started_at: Option<DateTime<Utc>>,
    last_event_at: Option<DateTime<Utc>>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn last_event_at(&self) -> Option<DateTime<Utc>> {
        self.last_event_at
    }

    pub fn record(&mut self, event: &ReviewEvent, outcome_correct: bool) -> SessionStats {
        let s = &mut self.stats;
        s.attempted += 1;
        if outcome_correct {
            s.correct += 1;
            s.streak += 1;
            s.best_streak = s.best_streak.max(s.streak);
        } else {
            s.streak = 0;
        }

        self.started_at.get_or_insert(event.timestamp);
        self.last_event_at = Some(event.timestamp);
        self.stats
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
