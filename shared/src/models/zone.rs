//! Geographic zone models

use serde::{Deserialize, Serialize};

use crate::models::Season;
use crate::types::{Target, TargetTable};

/// Base probability for a target the zone has no entry for
pub const DEFAULT_BASE_PROBABILITY: i32 = 50;

/// Axis-aligned bounding box, edges inclusive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lng >= self.lng_min && lng <= self.lng_max
    }
}

/// Altitude span in meters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AltitudeRange {
    pub min: i32,
    pub max: i32,
}

/// Static terrain characteristics of a zone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneCharacteristics {
    pub altitude: AltitudeRange,
    pub soil_type: String,
    pub forest_density: String,
    pub climate: String,
    pub moisture_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geology: Option<String>,
}

/// A named geographic zone with its per-target tables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoZone {
    /// Stable key, e.g. `northern_italy`
    pub name: String,
    /// Italian display name, e.g. `Nord Italia`
    pub label: String,
    pub bounds: BoundingBox,
    pub characteristics: ZoneCharacteristics,
    pub base_probability: TargetTable<i32>,
    pub common_species: TargetTable<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ZoneAnnotations>,
}

impl GeoZone {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.bounds.contains(lat, lng)
    }

    pub fn base_probability_for(&self, target: &Target) -> i32 {
        self.base_probability
            .get(target)
            .copied()
            .unwrap_or(DEFAULT_BASE_PROBABILITY)
    }
}

/// Field knowledge for zones that have been surveyed in detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneAnnotations {
    /// Upper-case heading used in generated analyses
    pub headline: String,
    /// Named search spots per target, injected into suggestions
    pub hotspots: TargetTable<Vec<String>>,
    /// Detailed search indicators replacing the generic ones
    pub search_indicators: TargetTable<Vec<String>>,
    /// Fallback indicator line for targets without an entry
    pub missing_indicators: String,
    pub seasonal_guides: Vec<SeasonalGuide>,
    pub seasonal_species: Vec<SeasonalSpecies>,
}

impl ZoneAnnotations {
    pub fn guide_for(&self, target: &Target, season: Season) -> Option<&SeasonalGuide> {
        self.seasonal_guides
            .iter()
            .find(|g| &g.target == target && g.season == season)
    }

    pub fn species_for(&self, season: Season) -> Option<&TargetTable<Vec<String>>> {
        self.seasonal_species
            .iter()
            .find(|s| s.season == season)
            .map(|s| &s.species)
    }
}

/// Zone-specific text for one target in one season.
///
/// `description` may contain `{altitude_min}` / `{altitude_max}` and
/// `suggestions` may contain `{hotspots}`; both are filled in from the zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalGuide {
    pub target: Target,
    pub season: Season,
    pub description: String,
    pub suggestions: String,
    /// Suggestions are only given from this probability upwards
    pub suggestions_min_probability: u8,
    /// Marks the guide as the optimal window, suppressing the generic praise
    pub optimal: bool,
}

/// Species list that overrides the season tables inside a zone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalSpecies {
    pub season: Season,
    pub species: TargetTable<Vec<String>>,
}
