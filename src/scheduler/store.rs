//! In-memory item registry with per-item ordering.
//!
//! Each item carries a version counter. A review names the version it was
//! computed against and is only committed if that version is still current,
//! so event N+1 always builds on the model produced by event N.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::error::StoreError;
use super::gate::PredictionGate;
use super::predictor::IntervalPredictor;
use super::types::{MemoryModel, PredictionResult, ReviewEvent};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedModel {
    pub model: MemoryModel,
    pub version: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub result: PredictionResult,
    pub version: u64,
}

#[derive(Debug, Clone, Default)]
struct ItemEntry {
    model: MemoryModel,
    version: u64,
    history: VecDeque<ReviewEvent>,
}

pub struct ItemStore {
    gate: Arc<PredictionGate>,
    items: RwLock<HashMap<String, ItemEntry>>,
    history_limit: usize,
}

impl ItemStore {
    pub fn new(gate: Arc<PredictionGate>, history_limit: usize) -> Self {
        Self {
            gate,
            items: RwLock::new(HashMap::new()),
            history_limit,
        }
    }

    pub fn gate(&self) -> &Arc<PredictionGate> {
        &self.gate
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Registers a fresh item. Returns `false` if the id is already known.
    pub async fn insert_new(&self, item_id: &str) -> bool {
        let mut items = self.items.write().await;
        if items.contains_key(item_id) {
            return false;
        }
        items.insert(item_id.to_string(), ItemEntry::default());
        true
    }

    pub async fn get(&self, item_id: &str) -> Option<VersionedModel> {
        self.items.read().await.get(item_id).map(|e| VersionedModel {
            model: e.model.clone(),
            version: e.version,
        })
    }

    /// Applies `event` to the item if `expected_version` is still current.
    /// Unknown items are created when `expected_version == 0`.
    pub async fn review(
        &self,
        item_id: &str,
        expected_version: u64,
        event: &ReviewEvent,
        predictor: Option<&dyn IntervalPredictor>,
    ) -> Result<ReviewOutcome, StoreError> {
        let snapshot = {
            let items = self.items.read().await;
            match items.get(item_id) {
                Some(entry) => entry.clone(),
                None if expected_version == 0 => ItemEntry::default(),
                None => return Err(StoreError::UnknownItem(item_id.to_string())),
            }
        };
        if snapshot.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: snapshot.version,
            });
        }

        let history: Vec<ReviewEvent> = snapshot.history.iter().cloned().collect();
        let result = self
            .gate
            .resolve_with_history(&snapshot.model, event, Some(&history), predictor)
            .await?;

        let mut items = self.items.write().await;
        let entry = items.entry(item_id.to_string()).or_default();
        if entry.version != expected_version {
            tracing::debug!(
                item_id,
                expected = expected_version,
                actual = entry.version,
                "concurrent review lost compare-and-swap"
            );
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: entry.version,
            });
        }

        entry.model = result.model.clone();
        entry.version += 1;
        entry.history.push_back(event.clone());
        while entry.history.len() > self.history_limit {
            entry.history.pop_front();
        }

        Ok(ReviewOutcome {
            result,
            version: entry.version,
        })
    }

    /// Never-reviewed items first, then the most overdue; ties go to the
    /// lexically smallest id.
    pub async fn next_due(&self, now: DateTime<Utc>) -> Option<String> {
        let items = self.items.read().await;
        items
            .iter()
            .filter(|(_, e)| e.model.is_due(now))
            .min_by(|(a_id, a), (b_id, b)| {
                a.model
                    .next_review_at
                    .cmp(&b.model.next_review_at)
                    .then_with(|| a_id.cmp(b_id))
            })
            .map(|(id, _)| id.clone())
    }

    pub async fn due_count(&self, now: DateTime<Utc>) -> usize {
        let items = self.items.read().await;
        items.values().filter(|e| e.model.is_due(now)).count()
    }

    /// All items, sorted by id.
    pub async fn snapshot(&self) -> Vec<(String, VersionedModel)> {
        let items = self.items.read().await;
        let mut out: Vec<_> = items
            .iter()
            .map(|(id, e)| {
                (
                    id.clone(),
                    VersionedModel {
                        model: e.model.clone(),
                        version: e.version,
                    },
                )
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::clock::FixedClock;
    use crate::scheduler::config::SchedulerConfig;
    use chrono::Duration;

    const FIXED_TIMESTAMP: i64 = 1_700_000_000_000;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(FIXED_TIMESTAMP).unwrap()
    }

    fn store() -> ItemStore {
        let gate = PredictionGate::new(
            SchedulerConfig::default(),
            Arc::new(FixedClock::from_timestamp_ms(FIXED_TIMESTAMP)),
        );
        ItemStore::new(Arc::new(gate), 10)
    }

    fn event(correct: bool) -> ReviewEvent {
        ReviewEvent::new(correct, 4, 1500.0, now())
    }

    #[tokio::test]
    async fn test_review_creates_and_versions() {
        let store = store();
        let outcome = store.review("hola", 0, &event(true), None).await.unwrap();
        assert_eq!(outcome.version, 1);

        let current = store.get("hola").await.unwrap();
        assert_eq!(current.version, 1);
        assert_eq!(current.model.total_reviews, 1);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let store = store();
        store.review("hola", 0, &event(true), None).await.unwrap();

        let err = store.review("hola", 0, &event(false), None).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionConflict {
                expected: 0,
                actual: 1
            }
        );
        assert_eq!(store.get("hola").await.unwrap().model.total_reviews, 1);
    }

    #[tokio::test]
    async fn test_unknown_item_with_nonzero_version() {
        let store = store();
        let err = store.review("nope", 3, &event(true), None).await.unwrap_err();
        assert_eq!(err, StoreError::UnknownItem("nope".into()));
    }

    #[tokio::test]
    async fn test_invalid_event_does_not_bump_version() {
        let store = store();
        store.insert_new("gato").await;
        let mut bad = event(true);
        bad.response_time_ms = -1.0;
        assert!(matches!(
            store.review("gato", 0, &bad, None).await,
            Err(StoreError::Scheduler(_))
        ));
        assert_eq!(store.get("gato").await.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_next_due_prefers_new_then_overdue() {
        let store = store();
        assert!(store.insert_new("b").await);
        assert!(!store.insert_new("b").await);
        store.review("a", 0, &event(true), None).await.unwrap();

        assert_eq!(store.next_due(now()).await.as_deref(), Some("b"));

        store.review("b", 0, &event(false), None).await.unwrap();
        assert_eq!(store.next_due(now()).await, None);

        let later = now() + Duration::days(30);
        assert_eq!(store.due_count(later).await, 2);
        // "b" failed (1 day), "a" passed with a longer interval
        assert_eq!(store.next_due(later).await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let gate = PredictionGate::new(
            SchedulerConfig::default(),
            Arc::new(FixedClock::from_timestamp_ms(FIXED_TIMESTAMP)),
        );
        let store = ItemStore::new(Arc::new(gate), 2);
        for v in 0..5 {
            store.review("x", v, &event(true), None).await.unwrap();
        }
        let items = store.items.read().await;
        assert_eq!(items.get("x").unwrap().history.len(), 2);
    }
}
