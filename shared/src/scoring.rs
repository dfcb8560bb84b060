//! Heuristic scoring engine
//!
//! Combines zone, season and weather tables with optional photo and sensor
//! evidence into a 0-100 probability. Photo evidence is a placeholder: unless
//! real provider labels are supplied, indicators are drawn at random. There is
//! no trained classifier behind any of these numbers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};

use crate::classify::{classify_season, sample_weather, weather_from_description, zone_hash};
use crate::models::{
    AnalysisSource, PhotoLabel, ScanRequest, ScanResult, ScoreBreakdown, SensorReading,
    WeatherCondition, ZoneWeights,
};
use crate::narrative::{compose, NarrativeInput};
use crate::reference::ReferenceData;
use crate::types::{round_half_up, Target};

/// Points per detected photo indicator
pub const PHOTO_INDICATOR_BONUS: i32 = 5;
/// Chance of a simulated indicator being dropped
const SIMULATED_DROP_RATE: f64 = 0.6;
/// Minimum provider score for a label to count
const LABEL_MIN_SCORE: f64 = 0.5;

/// Favorable features that can be spotted in a terrain photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoIndicator {
    MoistSoil,
    DenseVegetation,
    FavorableTrees,
    Moss,
    LeafLitter,
}

impl PhotoIndicator {
    pub const ALL: [PhotoIndicator; 5] = [
        PhotoIndicator::MoistSoil,
        PhotoIndicator::DenseVegetation,
        PhotoIndicator::FavorableTrees,
        PhotoIndicator::Moss,
        PhotoIndicator::LeafLitter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PhotoIndicator::MoistSoil => "terreno_umido",
            PhotoIndicator::DenseVegetation => "vegetazione_densa",
            PhotoIndicator::FavorableTrees => "alberi_favorevoli",
            PhotoIndicator::Moss => "muschio_presente",
            PhotoIndicator::LeafLitter => "foglie_decomposte",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            PhotoIndicator::MoistSoil => &["soil", "mud", "wet", "dirt"],
            PhotoIndicator::DenseVegetation => &["vegetation", "undergrowth", "shrub", "grass"],
            PhotoIndicator::FavorableTrees => {
                &["tree", "forest", "woodland", "oak", "hazel", "beech"]
            }
            PhotoIndicator::Moss => &["moss", "lichen"],
            PhotoIndicator::LeafLitter => &["leaf", "litter", "foliage"],
        }
    }
}

/// Source of photo indicators
pub trait PhotoLabeler {
    fn indicators(&self, rng: &mut dyn RngCore) -> Vec<PhotoIndicator>;
}

/// Stand-in for a vision model: keeps each indicator with ~40% chance
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedVision;

impl PhotoLabeler for SimulatedVision {
    fn indicators(&self, rng: &mut dyn RngCore) -> Vec<PhotoIndicator> {
        PhotoIndicator::ALL
            .into_iter()
            .filter(|_| rng.gen::<f64>() > SIMULATED_DROP_RATE)
            .collect()
    }
}

/// Maps real provider labels onto the indicator vocabulary
#[derive(Debug, Clone, Default)]
pub struct LabelMatcher {
    labels: Vec<PhotoLabel>,
}

impl LabelMatcher {
    pub fn new(labels: Vec<PhotoLabel>) -> Self {
        Self { labels }
    }
}

impl PhotoLabeler for LabelMatcher {
    fn indicators(&self, _rng: &mut dyn RngCore) -> Vec<PhotoIndicator> {
        let confident: Vec<String> = self
            .labels
            .iter()
            .filter(|l| l.score >= LABEL_MIN_SCORE)
            .map(|l| l.description.to_lowercase())
            .collect();
        PhotoIndicator::ALL
            .into_iter()
            .filter(|indicator| {
                confident
                    .iter()
                    .any(|label| indicator.keywords().iter().any(|k| label.contains(k)))
            })
            .collect()
    }
}

/// Bonus points for the detected indicators
pub fn photo_bonus(target: &Target, detected: &[PhotoIndicator]) -> i32 {
    let mut bonus = detected.len() as i32 * PHOTO_INDICATOR_BONUS;
    if *target == Target::Funghi && detected.contains(&PhotoIndicator::MoistSoil) {
        bonus += 10;
    }
    if *target == Target::Tartufi && detected.contains(&PhotoIndicator::FavorableTrees) {
        bonus += 15;
    }
    bonus
}

/// Fixed-threshold bonus for sensor readings; bounds are exclusive
pub fn sensor_bonus(target: &Target, reading: &SensorReading) -> i32 {
    let mut bonus = 0;
    match target {
        Target::Funghi => {
            if reading.voc > 100.0 && reading.voc < 300.0 {
                bonus += 20;
            }
            if reading.humidity > 70.0 {
                bonus += 10;
            }
        }
        Target::Tartufi => {
            if reading.voc > 150.0 && reading.voc < 400.0 {
                bonus += 25;
            }
            if reading.gas > 120_000.0 {
                bonus += 15;
            }
        }
        _ => {}
    }
    bonus
}

pub fn calculate_confidence(probability: u8, has_photo: bool, has_sensor: bool) -> u8 {
    let mut confidence: i32 = 60;
    if has_photo {
        confidence += 20;
    }
    if has_sensor {
        confidence += 20;
    }
    if probability > 80 {
        confidence += 10;
    } else if probability < 30 {
        confidence -= 15;
    }
    confidence.clamp(0, 100) as u8
}

/// Everything the engine needs besides the request
pub struct ScoringContext<'a> {
    /// Condition from a live feed; takes precedence over the description
    pub condition: Option<WeatherCondition>,
    /// Live description, echoed in the result and mapped by keyword
    pub weather_description: Option<String>,
    pub weights: Option<&'a ZoneWeights>,
    /// Photo indicator source; simulated when absent
    pub labeler: Option<&'a dyn PhotoLabeler>,
    pub elevation: Option<f64>,
    pub now: DateTime<Utc>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            condition: None,
            weather_description: None,
            weights: None,
            labeler: None,
            elevation: None,
            now,
        }
    }
}

impl Default for ScoringContext<'_> {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Stateless scorer over shared reference data
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    reference: Arc<ReferenceData>,
}

impl ScoringEngine {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn score(
        &self,
        request: &ScanRequest,
        ctx: &ScoringContext<'_>,
        rng: &mut dyn RngCore,
    ) -> ScanResult {
        let reference = &*self.reference;
        let target = &request.target;

        let zone = reference.classify_zone(request.latitude, request.longitude);
        let season = reference.season_profile(classify_season(request.timestamp.as_deref(), ctx.now));
        // An unrecognised live description stays cloudy rather than resampled
        let condition = match (ctx.condition, ctx.weather_description.as_deref()) {
            (Some(condition), _) => condition,
            (None, Some(description)) => {
                weather_from_description(description).unwrap_or(WeatherCondition::Cloudy)
            }
            (None, None) => sample_weather(season.season, rng),
        };
        let weather = reference.weather_profile(condition);

        let mut breakdown = ScoreBreakdown {
            base: zone.base_probability_for(target),
            season: season.modifiers.get(target).copied().unwrap_or(0),
            weather: weather.modifiers.get(target).copied().unwrap_or(0),
            ..ScoreBreakdown::default()
        };

        if request.has_photo() {
            let detected = match ctx.labeler {
                Some(labeler) => labeler.indicators(rng),
                None => SimulatedVision.indicators(rng),
            };
            breakdown.photo = photo_bonus(target, &detected);
        }
        if let Some(reading) = &request.sensor_data {
            breakdown.sensor = sensor_bonus(target, reading);
        }
        // Raw weight sum on the 0-100 scale, matching stored history
        breakdown.weights = ctx.weights.map(ZoneWeights::adjustment).unwrap_or(0.0);
        breakdown.noise = (rng.gen::<f64>() - 0.5) * 20.0;

        let probability = round_half_up(breakdown.raw_total(), 0).clamp(0.0, 100.0) as u8;
        let confidence = calculate_confidence(probability, request.has_photo(), request.has_sensor());

        let narrative = compose(&NarrativeInput {
            zone,
            target,
            season,
            weather,
            guidance: reference.guidance(),
            probability,
        });

        ScanResult {
            scan_id: None,
            probability,
            analysis: narrative.analysis,
            suggestions: narrative.suggestions,
            species: narrative.species,
            indicators: narrative.indicators,
            confidence,
            zone: zone.name.clone(),
            zone_hash: zone_hash(request.latitude, request.longitude),
            season: season.season,
            weather: ctx
                .weather_description
                .clone()
                .unwrap_or_else(|| weather.description.clone()),
            weather_condition: condition,
            elevation: ctx.elevation,
            source: AnalysisSource::Heuristic,
            breakdown,
            timestamp: ctx.now,
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(Arc::new(ReferenceData::italy()))
    }
}
