//! Offline replay of recorded review events through the scheduler.

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::{
    Clock, IntervalSource, ItemStore, PredictionGate, PredictionMetricsSnapshot, ReviewEvent,
    ReviewSession, SchedulerConfig, SessionStats, StoreError, VersionedModel,
};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid replay file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record {index} ({item_id}): {source}")]
    Review {
        index: usize,
        item_id: String,
        source: StoreError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    pub item_id: String,
    pub event: ReviewEvent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayItem {
    pub item_id: String,
    #[serde(flatten)]
    pub state: VersionedModel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub reviews: usize,
    pub ml_intervals: usize,
    pub session: SessionStats,
    pub metrics: PredictionMetricsSnapshot,
    pub items: Vec<ReplayItem>,
}

/// Clock that reports whatever instant the replay loop last set, so
/// historical events are scheduled relative to when they happened.
#[derive(Debug, Clone, Default)]
pub struct ReplayClock {
    now_ms: Arc<AtomicI64>,
}

impl ReplayClock {
    pub fn set(&self, at: DateTime<Utc>) {
        self.now_ms.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ReplayClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

pub fn load_records(path: &Path) -> Result<Vec<ReplayRecord>, ReplayError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

pub struct Replayer {
    clock: ReplayClock,
    store: ItemStore,
    session: ReviewSession,
}

impl Replayer {
    pub fn new(config: SchedulerConfig, history_limit: usize) -> Self {
        let clock = ReplayClock::default();
        let gate = PredictionGate::new(config, Arc::new(clock.clone()));
        Self {
            clock,
            store: ItemStore::new(Arc::new(gate), history_limit),
            session: ReviewSession::new(),
        }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub async fn run(&mut self, records: &[ReplayRecord]) -> Result<ReplayReport, ReplayError> {
        let mut ml_intervals = 0;

        for (index, record) in records.iter().enumerate() {
            let version = self
                .store
                .get(&record.item_id)
                .await
                .map(|v| v.version)
                .unwrap_or(0);

            self.clock.set(record.event.timestamp);
            let outcome = self
                .store
                .review(&record.item_id, version, &record.event, None)
                .await
                .map_err(|source| ReplayError::Review {
                    index,
                    item_id: record.item_id.clone(),
                    source,
                })?;

            if outcome.result.source == IntervalSource::Ml {
                ml_intervals += 1;
            }
            self.session.record(&record.event, record.event.correct);

            tracing::debug!(
                item_id = %record.item_id,
                interval = outcome.result.interval,
                source = outcome.result.source.as_str(),
                "replayed review"
            );
        }

        let items = self
            .store
            .snapshot()
            .await
            .into_iter()
            .map(|(item_id, state)| ReplayItem { item_id, state })
            .collect();

        Ok(ReplayReport {
            reviews: records.len(),
            ml_intervals,
            session: self.session.stats(),
            metrics: self.store.gate().metrics().snapshot(),
            items,
        })
    }
}
