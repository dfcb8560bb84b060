//! In-process store used when no database is configured

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sniffer_shared::learning::{apply_feedback, zone_accuracy};
use sniffer_shared::{FeedbackRecord, ScanRecord, ZoneWeights};

use super::{FeedbackReceipt, FeedbackStore, ScanStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    scans: Vec<ScanRecord>,
    feedback: Vec<FeedbackRecord>,
    weights: HashMap<String, ZoneWeights>,
}

/// Every table behind one lock; a feedback write is a single critical section
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn newest_first<T, F>(items: &[T], limit: i64, key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    let mut sorted: Vec<T> = items.to_vec();
    // Reverse first so equal keys keep newest-inserted first
    sorted.reverse();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)));
    sorted.truncate(limit.max(0) as usize);
    sorted
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn save_scan(&self, scan: &ScanRecord) -> StoreResult<()> {
        self.lock()?.scans.push(scan.clone());
        Ok(())
    }

    async fn list_scans(&self, limit: i64) -> StoreResult<Vec<ScanRecord>> {
        let tables = self.lock()?;
        Ok(newest_first(&tables.scans, limit, |s| s.created_at))
    }

    async fn count_scans(&self) -> StoreResult<usize> {
        Ok(self.lock()?.scans.len())
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn record_feedback(&self, record: &FeedbackRecord) -> StoreResult<FeedbackReceipt> {
        let mut tables = self.lock()?;
        tables.feedback.push(record.clone());

        let existing = tables.weights.remove(&record.zone_hash);
        let weights = apply_feedback(existing, record, Utc::now());
        tables
            .weights
            .insert(record.zone_hash.clone(), weights.clone());

        let accuracy = zone_accuracy(
            tables
                .feedback
                .iter()
                .filter(|r| r.zone_hash == record.zone_hash),
        );

        Ok(FeedbackReceipt {
            feedback_id: record.id,
            zone_accuracy: accuracy,
            weights,
        })
    }

    async fn list_feedback(&self, limit: i64) -> StoreResult<Vec<FeedbackRecord>> {
        let tables = self.lock()?;
        Ok(newest_first(&tables.feedback, limit, |r| r.timestamp))
    }

    async fn list_all_feedback(&self) -> StoreResult<Vec<FeedbackRecord>> {
        Ok(self.lock()?.feedback.clone())
    }

    async fn list_weights(&self) -> StoreResult<Vec<ZoneWeights>> {
        let tables = self.lock()?;
        let mut weights: Vec<ZoneWeights> = tables.weights.values().cloned().collect();
        weights.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| a.zone_hash.cmp(&b.zone_hash))
        });
        Ok(weights)
    }

    async fn get_weights(&self, zone_hash: &str) -> StoreResult<Option<ZoneWeights>> {
        Ok(self.lock()?.weights.get(zone_hash).cloned())
    }

    async fn health(&self) -> (&'static str, bool) {
        ("memory", self.tables.lock().is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sniffer_shared::Feedback;
    use std::sync::Arc;
    use uuid::Uuid;

    fn record(found: bool, predicted: f64, lat: f64, lon: f64) -> FeedbackRecord {
        let feedback = Feedback {
            scan_id: "scan".to_string(),
            found,
            predicted,
            latitude: lat,
            longitude: lon,
            elevation: Some(900.0),
            weather: Some("pioggia leggera, 12°C".to_string()),
            analysis: serde_json::Value::Null,
            timestamp: Some("2024-10-15T08:00:00Z".to_string()),
        };
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 8, 0, 0).unwrap();
        FeedbackRecord::from_feedback(feedback, Uuid::new_v4(), now)
    }

    #[tokio::test]
    async fn test_record_feedback_creates_and_updates_zone() {
        let store = MemoryStore::new();

        let first = store
            .record_feedback(&record(true, 80.0, 45.6, 11.0))
            .await
            .unwrap();
        assert_eq!(first.weights.sample_count, 1);
        assert_eq!(first.zone_accuracy, Some(100.0));

        let second = store
            .record_feedback(&record(true, 30.0, 45.6, 11.0))
            .await
            .unwrap();
        assert_eq!(second.weights.sample_count, 2);
        assert_eq!(second.zone_accuracy, Some(50.0));
        assert!((second.weights.elevation_weight - 0.2).abs() < 1e-9);
        assert_eq!(second.weights.zone_bias, 1.0);
    }

    #[tokio::test]
    async fn test_concurrent_feedback_keeps_every_sample() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .record_feedback(&record(i % 2 == 0, 60.0, 45.5, 10.9))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let weights = store.get_weights("45.5,10.9").await.unwrap().unwrap();
        assert_eq!(weights.sample_count, 32);
        assert_eq!(store.list_all_feedback().await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_listing_limit_and_order() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store
                .record_feedback(&record(false, 20.0, 45.0, 9.0))
                .await
                .unwrap();
        }
        assert_eq!(store.list_feedback(3).await.unwrap().len(), 3);
        assert_eq!(store.list_weights().await.unwrap().len(), 1);
        assert_eq!(store.health().await, ("memory", true));
    }
}
