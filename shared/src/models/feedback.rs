//! Feedback and zone weight models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Season, WeatherCategory};

/// Feedback body as received on the wire
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    #[validate(required, length(min = 1, max = 200))]
    pub scan_id: Option<String>,
    #[validate(required)]
    pub found: Option<bool>,
    #[serde(default)]
    pub predicted: f64,
    #[validate(required, range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(required, range(min = -180.0, max = 180.0))]
    pub lon: Option<f64>,
    pub elevation: Option<f64>,
    pub weather: Option<String>,
    #[serde(default)]
    pub analysis: serde_json::Value,
    pub timestamp: Option<String>,
}

impl FeedbackInput {
    /// Converts a validated body; `None` if a required field is missing
    pub fn into_feedback(self) -> Option<Feedback> {
        Some(Feedback {
            scan_id: self.scan_id?,
            found: self.found?,
            predicted: self.predicted,
            latitude: self.lat?,
            longitude: self.lon?,
            elevation: self.elevation,
            weather: self.weather,
            analysis: self.analysis,
            timestamp: self.timestamp.filter(|t| !t.trim().is_empty()),
        })
    }
}

/// Ground-truth observation for a previous scan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub scan_id: String,
    pub found: bool,
    /// Probability shown to the user for the scan
    pub predicted: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub weather: Option<String>,
    pub analysis: serde_json::Value,
    pub timestamp: Option<String>,
}

/// Append-only feedback log entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub scan_id: String,
    pub found: bool,
    pub predicted: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub weather_description: Option<String>,
    pub analysis: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    /// 100 when the prediction was on the right side of 50, else 0
    pub accuracy: i32,
    pub zone_hash: String,
    pub season: Season,
    pub weather_category: WeatherCategory,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Derives every computed column from the observation
    pub fn from_feedback(feedback: Feedback, id: Uuid, now: DateTime<Utc>) -> Self {
        let timestamp = feedback
            .timestamp
            .as_deref()
            .and_then(crate::classify::parse_timestamp)
            .unwrap_or(now);
        let season = crate::classify::classify_season(feedback.timestamp.as_deref(), now);
        Self {
            id,
            accuracy: crate::learning::compute_accuracy(feedback.predicted, feedback.found),
            zone_hash: crate::classify::zone_hash(feedback.latitude, feedback.longitude),
            season,
            weather_category: crate::classify::categorize_weather(feedback.weather.as_deref()),
            scan_id: feedback.scan_id,
            found: feedback.found,
            predicted: feedback.predicted,
            latitude: feedback.latitude,
            longitude: feedback.longitude,
            elevation: feedback.elevation,
            weather_description: feedback.weather,
            analysis: feedback.analysis,
            timestamp,
            created_at: now,
        }
    }

    pub fn is_accurate(&self) -> bool {
        self.accuracy == 100
    }
}

/// Learned correction terms for one zone hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneWeights {
    pub zone_hash: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_weight: f64,
    pub weather_weight: f64,
    pub season_weight: f64,
    pub zone_bias: f64,
    pub sample_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ZoneWeights {
    /// Sum folded into the probability by the scoring engine
    pub fn adjustment(&self) -> f64 {
        self.elevation_weight + self.weather_weight + self.season_weight + self.zone_bias
    }
}

/// Stored scan with its serialized result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanRecord {
    pub id: Uuid,
    pub target: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub weather_description: String,
    pub probability: i32,
    pub confidence: i32,
    pub voc: Option<f64>,
    pub humidity: Option<f64>,
    pub zone_hash: String,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
