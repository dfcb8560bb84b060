//! Scan request/result models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Season, WeatherCondition};
use crate::types::Target;

/// Analyze request as received on the wire
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanInput {
    #[validate(required, length(min = 1, max = 100))]
    pub target: Option<String>,
    #[validate(required, range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(required, range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub timestamp: Option<String>,
    /// Base64 image, optionally with a `data:` prefix
    pub photo: Option<String>,
    #[serde(alias = "sensor_data")]
    pub sensor_data: Option<SensorReading>,
}

impl ScanInput {
    /// Converts a validated input into the engine request.
    ///
    /// Returns `None` when a required field is missing, which only happens
    /// if validation was skipped.
    pub fn into_request(self) -> Option<ScanRequest> {
        let target = self.target?;
        Some(ScanRequest {
            target: Target::from(target),
            latitude: self.latitude?,
            longitude: self.longitude?,
            timestamp: self.timestamp.filter(|t| !t.trim().is_empty()),
            photo: self.photo.filter(|p| !p.trim().is_empty()),
            sensor_data: self.sensor_data,
        })
    }
}

/// Reading from the handheld sniffer peripheral
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SensorReading {
    #[serde(default)]
    pub voc: f64,
    #[serde(default)]
    pub gas: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub temp: Option<f64>,
}

/// Input consumed by the scoring engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanRequest {
    pub target: Target,
    pub latitude: f64,
    pub longitude: f64,
    /// ISO 8601; `None` means "now"
    pub timestamp: Option<String>,
    pub photo: Option<String>,
    pub sensor_data: Option<SensorReading>,
}

impl ScanRequest {
    pub fn new(target: impl Into<Target>, latitude: f64, longitude: f64) -> Self {
        Self {
            target: target.into(),
            latitude,
            longitude,
            timestamp: None,
            photo: None,
            sensor_data: None,
        }
    }

    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }

    pub fn with_sensor(mut self, reading: SensorReading) -> Self {
        self.sensor_data = Some(reading);
        self
    }

    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    pub fn has_sensor(&self) -> bool {
        self.sensor_data.is_some()
    }
}

/// A single label returned by an image-labeling provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoLabel {
    pub description: String,
    pub score: f64,
}

/// Which path produced the analysis text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    #[default]
    Heuristic,
    Llm,
}

/// Additive terms that produced the probability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub base: i32,
    pub season: i32,
    pub weather: i32,
    pub photo: i32,
    pub sensor: i32,
    pub weights: f64,
    pub noise: f64,
}

impl ScoreBreakdown {
    pub fn raw_total(&self) -> f64 {
        f64::from(self.base + self.season + self.weather + self.photo + self.sensor)
            + self.weights
            + self.noise
    }
}

/// Result of a scan analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanResult {
    /// Set once the scan has been stored
    pub scan_id: Option<uuid::Uuid>,
    pub probability: u8,
    pub analysis: String,
    pub suggestions: String,
    pub species: Vec<String>,
    pub indicators: Vec<String>,
    pub confidence: u8,
    pub zone: String,
    pub zone_hash: String,
    pub season: Season,
    /// Italian weather description
    pub weather: String,
    pub weather_condition: WeatherCondition,
    pub elevation: Option<f64>,
    pub source: AnalysisSource,
    pub breakdown: ScoreBreakdown,
    pub timestamp: DateTime<Utc>,
}

/// Structured output of the text-analysis provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextAnalysis {
    pub probability: f64,
    pub analysis: String,
    pub suggestions: Option<String>,
    pub species: Option<Vec<String>>,
    pub confidence: u8,
}

impl ScanResult {
    /// Replaces the heuristic text with a provider analysis.
    ///
    /// The probability is clamped and rounded; evidence echoes are kept.
    pub fn with_text_analysis(mut self, text: TextAnalysis) -> Self {
        self.probability = text.probability.clamp(0.0, 100.0).round() as u8;
        self.analysis = text.analysis;
        if let Some(suggestions) = text.suggestions {
            self.suggestions = suggestions;
        }
        if let Some(species) = text.species {
            self.species = species;
        }
        self.confidence = text.confidence.min(100);
        self.source = AnalysisSource::Llm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_input_empty_photo_is_absent() {
        let input: ScanInput = serde_json::from_str(
            r#"{"target":"funghi","latitude":45.5,"longitude":10.9,"photo":"","sensorData":{"voc":120,"gas":90000}}"#,
        )
        .unwrap();
        let request = input.into_request().unwrap();
        assert!(!request.has_photo());
        let sensor = request.sensor_data.unwrap();
        assert_eq!(sensor.voc, 120.0);
        assert_eq!(sensor.humidity, 0.0);
        assert_eq!(sensor.temp, None);
    }

    #[test]
    fn test_scan_input_requires_coordinates() {
        let input: ScanInput = serde_json::from_str(r#"{"target":"funghi","latitude":45.5}"#).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_scan_input_rejects_out_of_range_latitude() {
        let input: ScanInput =
            serde_json::from_str(r#"{"target":"erbe","latitude":95.0,"longitude":10.0}"#).unwrap();
        assert!(input.validate().is_err());
    }
}
