//! Scan analysis: environment lookups, scoring and persistence
//!
//! Provider failures never fail a scan. Each lookup has a local fallback
//! and the heuristic result is kept whenever the text analysis fails.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};
use sniffer_shared::classify::{classify_season, sample_weather, zone_hash};
use sniffer_shared::scoring::{LabelMatcher, PhotoLabeler, ScoringContext, ScoringEngine};
use sniffer_shared::{
    PhotoLabel, ScanRecord, ScanRequest, ScanResult, Season, WeatherCondition, WeatherReport,
    ZoneWeights,
};
use tracing::{debug, error, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::llm::PromptInput;
use crate::external::Providers;
use crate::store::{FeedbackStore, ScanStore};
use crate::AppState;

/// Fallback elevation range in meters, upper bound exclusive
const FALLBACK_ELEVATION: (u32, u32) = (400, 1200);

/// Location-only lookup body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnvironmentInput {
    #[validate(required, range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(required, range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Elevation and weather for a location, live or simulated
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentReport {
    pub elevation: f64,
    pub weather: WeatherReport,
    pub zone: String,
    pub zone_hash: String,
    pub season: Season,
    pub coordinates: Coordinates,
}

/// Weather lookup outcome; `condition` is set only for simulated weather
struct WeatherLookup {
    report: WeatherReport,
    condition: Option<WeatherCondition>,
}

pub struct ScanService {
    engine: Arc<ScoringEngine>,
    providers: Arc<Providers>,
    scans: Arc<dyn ScanStore>,
    weights: Arc<dyn FeedbackStore>,
    rng: Arc<Mutex<StdRng>>,
}

impl ScanService {
    pub fn new(state: &AppState) -> Self {
        Self {
            engine: state.engine.clone(),
            providers: state.providers.clone(),
            scans: state.scans.clone(),
            weights: state.feedback.clone(),
            rng: state.rng.clone(),
        }
    }

    /// Runs `f` with the shared generator; never held across an await
    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> AppResult<T> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::Internal("random generator lock poisoned".to_string()))?;
        Ok(f(&mut rng))
    }

    /// Full analysis of one scan, persisted when the store is reachable
    pub async fn analyze(&self, request: ScanRequest) -> AppResult<ScanResult> {
        let now = Utc::now();
        let (lat, lon) = (request.latitude, request.longitude);
        debug!("Analyzing {} at {}, {}", request.target, lat, lon);

        let elevation = self.elevation(lat, lon).await?;
        let season = classify_season(request.timestamp.as_deref(), now);
        let weather = self.weather(lat, lon, season).await?;
        let labels = match &request.photo {
            Some(photo) => self.photo_labels(photo).await,
            None => None,
        };
        let weights = self.zone_weights(&zone_hash(lat, lon)).await;

        let mut result = {
            let matcher = labels.clone().map(LabelMatcher::new);
            let ctx = ScoringContext {
                condition: weather.condition,
                weather_description: weather
                    .report
                    .live
                    .then(|| weather.report.description.clone()),
                weights: weights.as_ref(),
                labeler: matcher.as_ref().map(|m| m as &dyn PhotoLabeler),
                elevation: Some(elevation),
                now,
            };
            self.with_rng(|rng| self.engine.score(&request, &ctx, rng))?
        };

        if let Some(llm) = &self.providers.llm {
            let prompt = PromptInput {
                target: &request.target,
                latitude: lat,
                longitude: lon,
                elevation,
                weather: &weather.report,
                labels: labels.as_deref().unwrap_or_default(),
                sensor: request.sensor_data.as_ref(),
            };
            match llm.get_text_analysis(&prompt).await {
                Ok(text) => result = result.with_text_analysis(text),
                Err(e) => warn!("Text analysis failed, keeping heuristic result: {}", e),
            }
        }

        self.persist(&request, result, now).await
    }

    /// Elevation and weather only, for the location preview
    pub async fn environment(&self, input: EnvironmentInput) -> AppResult<EnvironmentReport> {
        input
            .validate()
            .map_err(sniffer_shared::ValidationError::from)?;
        let (latitude, longitude) = match (input.latitude, input.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(sniffer_shared::ValidationError::new("latitude", "is required").into())
            }
        };

        let season = classify_season(input.timestamp.as_deref(), Utc::now());
        let elevation = self.elevation(latitude, longitude).await?;
        let weather = self.weather(latitude, longitude, season).await?;
        let zone = self.engine.reference().classify_zone(latitude, longitude);

        Ok(EnvironmentReport {
            elevation,
            weather: weather.report,
            zone: zone.name.clone(),
            zone_hash: zone_hash(latitude, longitude),
            season,
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        })
    }

    async fn elevation(&self, lat: f64, lon: f64) -> AppResult<f64> {
        let lookup = match &self.providers.elevation {
            Some(client) => client.get_elevation(lat, lon).await,
            None => Err(AppError::ProviderDisabled("elevation".to_string())),
        };
        match lookup {
            Ok(meters) => Ok(meters),
            Err(e) => {
                warn!("Elevation lookup failed, using estimate: {}", e);
                self.with_rng(|rng| {
                    f64::from(rng.gen_range(FALLBACK_ELEVATION.0..FALLBACK_ELEVATION.1))
                })
            }
        }
    }

    async fn weather(&self, lat: f64, lon: f64, season: Season) -> AppResult<WeatherLookup> {
        let lookup = match &self.providers.weather {
            Some(client) => client.get_current_weather(lat, lon).await,
            None => Err(AppError::ProviderDisabled("weather".to_string())),
        };
        match lookup {
            Ok(report) => Ok(WeatherLookup {
                report,
                condition: None,
            }),
            Err(e) => {
                warn!("Weather lookup failed, simulating conditions: {}", e);
                let condition = self.with_rng(|rng| sample_weather(season, rng))?;
                let profile = self.engine.reference().weather_profile(condition);
                Ok(WeatherLookup {
                    report: WeatherReport {
                        description: profile.description.clone(),
                        temperature: None,
                        humidity: None,
                        pressure: None,
                        condition: Some(condition.name().to_string()),
                        live: false,
                    },
                    condition: Some(condition),
                })
            }
        }
    }

    /// `None` means the indicators are simulated
    async fn photo_labels(&self, photo: &str) -> Option<Vec<PhotoLabel>> {
        let client = self.providers.vision.as_ref()?;
        match client.get_photo_labels(photo).await {
            Ok(labels) => Some(labels),
            Err(e) => {
                warn!("Photo labeling failed, simulating indicators: {}", e);
                None
            }
        }
    }

    async fn zone_weights(&self, zone_hash: &str) -> Option<ZoneWeights> {
        match self.weights.get_weights(zone_hash).await {
            Ok(weights) => weights,
            Err(e) => {
                warn!("Zone weights unavailable for {}: {}", zone_hash, e);
                None
            }
        }
    }

    async fn persist(
        &self,
        request: &ScanRequest,
        mut result: ScanResult,
        now: DateTime<Utc>,
    ) -> AppResult<ScanResult> {
        let id = Uuid::new_v4();
        result.scan_id = Some(id);
        let record = ScanRecord {
            id,
            target: request.target.to_string(),
            latitude: request.latitude,
            longitude: request.longitude,
            elevation: result.elevation,
            weather_description: result.weather.clone(),
            probability: i32::from(result.probability),
            confidence: i32::from(result.confidence),
            voc: request.sensor_data.as_ref().map(|s| s.voc),
            humidity: request.sensor_data.as_ref().map(|s| s.humidity),
            zone_hash: result.zone_hash.clone(),
            result: serde_json::to_value(&result)
                .map_err(|e| AppError::Internal(format!("Failed to serialize scan: {}", e)))?,
            created_at: now,
        };

        if let Err(e) = self.scans.save_scan(&record).await {
            error!("Scan {} not saved: {}", id, e);
            result.scan_id = None;
        }
        Ok(result)
    }
}
