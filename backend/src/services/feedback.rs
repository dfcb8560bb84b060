//! Feedback ingestion
//!
//! A storage failure is reported in the response body instead of as an
//! HTTP error, so the client can keep the observation and retry later.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sniffer_shared::{Feedback, FeedbackRecord};
use tracing::{error, info};
use uuid::Uuid;

use crate::store::FeedbackStore;

const SAVED_MESSAGE: &str = "Feedback salvato con successo";
const NOT_SAVED_MESSAGE: &str = "Feedback non salvato, riprova più tardi";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    pub feedback_id: Option<Uuid>,
    /// Zone accuracy in percent after this observation
    pub accuracy: Option<f64>,
    pub message: String,
}

pub struct FeedbackService {
    store: Arc<dyn FeedbackStore>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, feedback: Feedback) -> FeedbackResponse {
        let record = FeedbackRecord::from_feedback(feedback, Uuid::new_v4(), Utc::now());

        match self.store.record_feedback(&record).await {
            Ok(receipt) => {
                info!(
                    "Feedback {} for zone {} (found: {}, samples: {})",
                    receipt.feedback_id, record.zone_hash, record.found, receipt.weights.sample_count
                );
                FeedbackResponse {
                    success: true,
                    feedback_id: Some(receipt.feedback_id),
                    accuracy: receipt.zone_accuracy,
                    message: SAVED_MESSAGE.to_string(),
                }
            }
            Err(e) => {
                error!("Feedback for scan {} not saved: {}", record.scan_id, e);
                FeedbackResponse {
                    success: false,
                    feedback_id: None,
                    accuracy: None,
                    message: NOT_SAVED_MESSAGE.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FeedbackReceipt, MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use sniffer_shared::ZoneWeights;

    fn feedback(found: bool, predicted: f64, elevation: Option<f64>, weather: &str) -> Feedback {
        Feedback {
            scan_id: "scan-1".to_string(),
            found,
            predicted,
            latitude: 45.5512,
            longitude: 10.9498,
            elevation,
            weather: Some(weather.to_string()),
            analysis: serde_json::json!({"probability": predicted}),
            timestamp: Some("2024-10-20T07:30:00Z".to_string()),
        }
    }

    #[tokio::test]
    async fn test_first_feedback_creates_zone_row() {
        let store = Arc::new(MemoryStore::new());
        let service = FeedbackService::new(store.clone());

        let response = service
            .record(feedback(true, 75.0, Some(900.0), "pioggia leggera, 11°C"))
            .await;

        assert!(response.success);
        assert!(response.feedback_id.is_some());
        assert_eq!(response.accuracy, Some(100.0));
        assert_eq!(response.message, SAVED_MESSAGE);

        let weights = store.get_weights("45.551,10.95").await.unwrap().unwrap();
        assert_eq!(weights.sample_count, 1);
        assert!((weights.elevation_weight - 0.1).abs() < 1e-9);
        assert!((weights.weather_weight - 0.1).abs() < 1e-9);
        assert!((weights.season_weight - 0.15).abs() < 1e-9);
        assert_eq!(weights.zone_bias, 1.0);
    }

    #[tokio::test]
    async fn test_wrong_prediction_lowers_accuracy_and_flips_bias() {
        let store = Arc::new(MemoryStore::new());
        let service = FeedbackService::new(store.clone());

        service
            .record(feedback(true, 75.0, Some(900.0), "pioggia leggera, 11°C"))
            .await;
        let response = service
            .record(feedback(false, 80.0, Some(900.0), "pioggia leggera, 11°C"))
            .await;

        assert_eq!(response.accuracy, Some(50.0));
        let weights = store.get_weights("45.551,10.95").await.unwrap().unwrap();
        assert_eq!(weights.sample_count, 2);
        assert!((weights.elevation_weight - 0.05).abs() < 1e-9);
        assert!((weights.season_weight - 0.05).abs() < 1e-9);
        assert_eq!(weights.zone_bias, -1.0);
    }

    struct BrokenStore;

    #[async_trait]
    impl FeedbackStore for BrokenStore {
        async fn record_feedback(&self, _: &FeedbackRecord) -> StoreResult<FeedbackReceipt> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
        async fn list_feedback(&self, _: i64) -> StoreResult<Vec<FeedbackRecord>> {
            Ok(Vec::new())
        }
        async fn list_all_feedback(&self) -> StoreResult<Vec<FeedbackRecord>> {
            Ok(Vec::new())
        }
        async fn list_weights(&self) -> StoreResult<Vec<ZoneWeights>> {
            Ok(Vec::new())
        }
        async fn get_weights(&self, _: &str) -> StoreResult<Option<ZoneWeights>> {
            Ok(None)
        }
        async fn health(&self) -> (&'static str, bool) {
            ("broken", false)
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_soft() {
        let service = FeedbackService::new(Arc::new(BrokenStore));
        let response = service.record(feedback(true, 60.0, None, "")).await;

        assert!(!response.success);
        assert_eq!(response.feedback_id, None);
        assert_eq!(response.accuracy, None);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["feedbackId"].is_null());
    }
}
