//! Dashboard listings, analytics and CSV export

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use sniffer_shared::analytics::{compute_analytics, Analytics};
use sniffer_shared::{FeedbackRecord, ScanRecord, ValidationError, ZoneWeights};

use crate::error::{AppError, AppResult};
use crate::store::{FeedbackStore, ScanStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardKind {
    Feedback,
    Scans,
    Weights,
    Analytics,
}

impl DashboardKind {
    pub fn name(&self) -> &'static str {
        match self {
            DashboardKind::Feedback => "feedback",
            DashboardKind::Scans => "scans",
            DashboardKind::Weights => "weights",
            DashboardKind::Analytics => "analytics",
        }
    }
}

impl FromStr for DashboardKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feedback" => Ok(DashboardKind::Feedback),
            "scans" | "scansioni" => Ok(DashboardKind::Scans),
            "weights" => Ok(DashboardKind::Weights),
            "analytics" => Ok(DashboardKind::Analytics),
            _ => Err(ValidationError::new("type", "is not a dashboard type")),
        }
    }
}

/// A dashboard payload; serialized as the bare list or document
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DashboardData {
    Feedback(Vec<FeedbackRecord>),
    Scans(Vec<ScanRecord>),
    Weights(Vec<ZoneWeights>),
    Analytics(Box<Analytics>),
}

#[derive(Serialize)]
struct FeedbackCsvRow<'a> {
    id: String,
    scan_id: &'a str,
    found: bool,
    predicted: f64,
    accuracy: i32,
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    weather: Option<&'a str>,
    weather_category: &'a str,
    season: &'a str,
    zone_hash: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct ScanCsvRow<'a> {
    id: String,
    target: &'a str,
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    weather: &'a str,
    probability: i32,
    confidence: i32,
    voc: Option<f64>,
    humidity: Option<f64>,
    zone_hash: &'a str,
    created_at: String,
}

#[derive(Serialize)]
struct WeightsCsvRow<'a> {
    zone_hash: &'a str,
    latitude: f64,
    longitude: f64,
    elevation_weight: f64,
    weather_weight: f64,
    season_weight: f64,
    zone_bias: f64,
    sample_count: i64,
    last_updated: String,
}

pub struct DashboardService {
    scans: Arc<dyn ScanStore>,
    feedback: Arc<dyn FeedbackStore>,
    limit: i64,
}

impl DashboardService {
    pub fn new(scans: Arc<dyn ScanStore>, feedback: Arc<dyn FeedbackStore>, limit: i64) -> Self {
        Self {
            scans,
            feedback,
            limit,
        }
    }

    pub async fn fetch(&self, kind: DashboardKind) -> AppResult<DashboardData> {
        let data = match kind {
            DashboardKind::Feedback => {
                DashboardData::Feedback(self.feedback.list_feedback(self.limit).await?)
            }
            DashboardKind::Scans => DashboardData::Scans(self.scans.list_scans(self.limit).await?),
            DashboardKind::Weights => DashboardData::Weights(self.feedback.list_weights().await?),
            DashboardKind::Analytics => DashboardData::Analytics(Box::new(self.analytics().await?)),
        };
        Ok(data)
    }

    /// Aggregates over the complete feedback log
    pub async fn analytics(&self) -> AppResult<Analytics> {
        let feedback = self.feedback.list_all_feedback().await?;
        let weights = self.feedback.list_weights().await?;
        let total_scans = self.scans.count_scans().await?;
        Ok(compute_analytics(&feedback, &weights).with_total_scans(total_scans))
    }

    pub async fn zone_weights(&self, zone_hash: &str) -> AppResult<ZoneWeights> {
        sniffer_shared::validate_zone_hash(zone_hash)
            .map_err(|msg| ValidationError::new("zone_hash", msg))?;
        self.feedback
            .get_weights(zone_hash)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Zone {}", zone_hash)))
    }

    /// Listings as CSV; the analytics document has no tabular form
    pub fn export_to_csv(data: &DashboardData) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        let written = match data {
            DashboardData::Feedback(records) => records.iter().try_for_each(|r| {
                wtr.serialize(FeedbackCsvRow {
                    id: r.id.to_string(),
                    scan_id: &r.scan_id,
                    found: r.found,
                    predicted: r.predicted,
                    accuracy: r.accuracy,
                    latitude: r.latitude,
                    longitude: r.longitude,
                    elevation: r.elevation,
                    weather: r.weather_description.as_deref(),
                    weather_category: r.weather_category.as_str(),
                    season: r.season.name(),
                    zone_hash: &r.zone_hash,
                    timestamp: r.timestamp.to_rfc3339(),
                })
            }),
            DashboardData::Scans(records) => records.iter().try_for_each(|r| {
                wtr.serialize(ScanCsvRow {
                    id: r.id.to_string(),
                    target: &r.target,
                    latitude: r.latitude,
                    longitude: r.longitude,
                    elevation: r.elevation,
                    weather: &r.weather_description,
                    probability: r.probability,
                    confidence: r.confidence,
                    voc: r.voc,
                    humidity: r.humidity,
                    zone_hash: &r.zone_hash,
                    created_at: r.created_at.to_rfc3339(),
                })
            }),
            DashboardData::Weights(rows) => rows.iter().try_for_each(|w| {
                wtr.serialize(WeightsCsvRow {
                    zone_hash: &w.zone_hash,
                    latitude: w.latitude,
                    longitude: w.longitude,
                    elevation_weight: w.elevation_weight,
                    weather_weight: w.weather_weight,
                    season_weight: w.season_weight,
                    zone_bias: w.zone_bias,
                    sample_count: w.sample_count,
                    last_updated: w.last_updated.to_rfc3339(),
                })
            }),
            DashboardData::Analytics(_) => {
                return Err(ValidationError::new("format", "csv is not available for analytics").into())
            }
        };
        written.map_err(|e| AppError::Export(format!("CSV serialization error: {}", e)))?;

        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Export(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Export(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::FeedbackService;
    use crate::store::MemoryStore;
    use sniffer_shared::Feedback;

    fn feedback(found: bool, predicted: f64, lat: f64, lon: f64, day: u32) -> Feedback {
        Feedback {
            scan_id: format!("scan-{}", day),
            found,
            predicted,
            latitude: lat,
            longitude: lon,
            elevation: Some(650.0),
            weather: Some("nuvoloso, 9°C".to_string()),
            analysis: serde_json::Value::Null,
            timestamp: Some(format!("2024-10-{:02}T10:00:00Z", day)),
        }
    }

    async fn seeded_service() -> DashboardService {
        let store = Arc::new(MemoryStore::new());
        let feedback_service = FeedbackService::new(store.clone());
        for (i, found) in [true, true, false, true].into_iter().enumerate() {
            feedback_service
                .record(feedback(found, 70.0, 45.6, 11.0, 10 + i as u32))
                .await;
        }
        feedback_service
            .record(feedback(false, 20.0, 44.0, 12.0, 20))
            .await;
        DashboardService::new(store.clone(), store, 200)
    }

    #[test]
    fn test_dashboard_kind_parsing() {
        assert_eq!("feedback".parse::<DashboardKind>().unwrap(), DashboardKind::Feedback);
        assert_eq!("scansioni".parse::<DashboardKind>().unwrap(), DashboardKind::Scans);
        assert_eq!(" Analytics ".parse::<DashboardKind>().unwrap(), DashboardKind::Analytics);
        assert!("models".parse::<DashboardKind>().is_err());
    }

    #[tokio::test]
    async fn test_analytics_over_store() {
        let service = seeded_service().await;
        let analytics = service.analytics().await.unwrap();

        assert_eq!(analytics.summary.total_feedback, 5);
        assert_eq!(analytics.summary.total_zones, 2);
        assert_eq!(analytics.summary.total_scans, 0);
        // 70 predicted: 3 of 4 right in the first zone, 20 predicted and not found is right
        assert_eq!(analytics.summary.overall_accuracy, 80);
        assert_eq!(analytics.summary.success_rate, 60);
        assert_eq!(analytics.zones.top_performing_zones.len(), 1);
        assert_eq!(analytics.zones.top_performing_zones[0].zone, "45.6,11");
        assert_eq!(analytics.ml_status.total_weights, 2);
        assert_eq!(analytics.ml_status.active_zones, 1);
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let service = seeded_service().await;
        match service.fetch(DashboardKind::Feedback).await.unwrap() {
            DashboardData::Feedback(records) => {
                assert_eq!(records.len(), 5);
                assert_eq!(records[0].scan_id, "scan-20");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zone_weights_lookup() {
        let service = seeded_service().await;
        let weights = service.zone_weights("45.6,11").await.unwrap();
        assert_eq!(weights.sample_count, 4);
        assert!(matches!(
            service.zone_weights("45.7,11").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.zone_weights("north").await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_csv_export() {
        let service = seeded_service().await;
        let data = service.fetch(DashboardKind::Weights).await.unwrap();
        let csv = DashboardService::export_to_csv(&data).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("zone_hash,latitude,longitude,elevation_weight,weather_weight,season_weight,zone_bias,sample_count,last_updated")
        );
        assert_eq!(lines.count(), 2);

        let analytics = service.fetch(DashboardKind::Analytics).await.unwrap();
        assert!(DashboardService::export_to_csv(&analytics).is_err());
    }
}
