//! Reference tables for zones, seasons and weather
//!
//! Immutable data handed to the scoring engine at construction time. The
//! built-in Italian tables come from field surveys; tests can build their
//! own through [`ReferenceData::new`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    AltitudeRange, BoundingBox, GeoZone, Season, SeasonProfile, SeasonalGuide, SeasonalSpecies,
    WeatherCondition, WeatherProfile, ZoneAnnotations, ZoneCharacteristics,
};
use crate::types::{strings, Target, TargetTable};

/// Inconsistent reference tables
#[derive(Debug, Error, PartialEq)]
pub enum ReferenceError {
    #[error("no zones defined")]
    NoZones,
    #[error("default zone `{0}` is not in the zone list")]
    UnknownDefaultZone(String),
    #[error("missing profile for season `{0}`")]
    MissingSeason(Season),
    #[error("missing profile for weather `{0}`")]
    MissingWeather(WeatherCondition),
}

/// Generic search advice used outside annotated zones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchGuidance {
    pub optimal_trees: TargetTable<String>,
    pub default_trees: String,
    /// Short comma-separated hints for suggestions
    pub search_hints: TargetTable<String>,
    pub default_hint: String,
    /// Detailed indicator lists returned with a result
    pub search_indicators: TargetTable<Vec<String>>,
    pub missing_indicators: String,
}

impl SearchGuidance {
    pub fn trees_for(&self, target: &Target) -> &str {
        self.optimal_trees
            .get(target)
            .map(String::as_str)
            .unwrap_or(&self.default_trees)
    }

    pub fn hint_for(&self, target: &Target) -> &str {
        self.search_hints
            .get(target)
            .map(String::as_str)
            .unwrap_or(&self.default_hint)
    }
}

/// Validated reference tables
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReferenceData {
    zones: Vec<GeoZone>,
    default_zone: usize,
    /// Indexed in `Season::ALL` order
    seasons: Vec<SeasonProfile>,
    /// Indexed in `WeatherCondition::ALL` order
    weather: Vec<WeatherProfile>,
    guidance: SearchGuidance,
}

impl ReferenceData {
    /// Builds reference data; zones keep their priority order.
    pub fn new(
        zones: Vec<GeoZone>,
        default_zone: &str,
        seasons: Vec<SeasonProfile>,
        weather: Vec<WeatherProfile>,
        guidance: SearchGuidance,
    ) -> Result<Self, ReferenceError> {
        if zones.is_empty() {
            return Err(ReferenceError::NoZones);
        }
        let default_zone = zones
            .iter()
            .position(|z| z.name == default_zone)
            .ok_or_else(|| ReferenceError::UnknownDefaultZone(default_zone.to_string()))?;

        let mut ordered_seasons = Vec::with_capacity(Season::ALL.len());
        for season in Season::ALL {
            let profile = seasons
                .iter()
                .find(|p| p.season == season)
                .ok_or(ReferenceError::MissingSeason(season))?;
            ordered_seasons.push(profile.clone());
        }

        let mut ordered_weather = Vec::with_capacity(WeatherCondition::ALL.len());
        for condition in WeatherCondition::ALL {
            let profile = weather
                .iter()
                .find(|p| p.condition == condition)
                .ok_or(ReferenceError::MissingWeather(condition))?;
            ordered_weather.push(profile.clone());
        }

        Ok(Self {
            zones,
            default_zone,
            seasons: ordered_seasons,
            weather: ordered_weather,
            guidance,
        })
    }

    /// First zone containing the point, else the default zone
    pub fn classify_zone(&self, lat: f64, lng: f64) -> &GeoZone {
        self.zones
            .iter()
            .find(|z| z.contains(lat, lng))
            .unwrap_or(&self.zones[self.default_zone])
    }

    pub fn zones(&self) -> &[GeoZone] {
        &self.zones
    }

    pub fn default_zone(&self) -> &GeoZone {
        &self.zones[self.default_zone]
    }

    pub fn season_profile(&self, season: Season) -> &SeasonProfile {
        let index = Season::ALL.iter().position(|s| *s == season).unwrap_or(0);
        &self.seasons[index]
    }

    pub fn weather_profile(&self, condition: WeatherCondition) -> &WeatherProfile {
        let index = WeatherCondition::ALL
            .iter()
            .position(|c| *c == condition)
            .unwrap_or(0);
        &self.weather[index]
    }

    pub fn guidance(&self) -> &SearchGuidance {
        &self.guidance
    }

    /// Built-in tables for Italy
    pub fn italy() -> Self {
        Self {
            zones: italian_zones(),
            // central_italy
            default_zone: 2,
            seasons: season_profiles(),
            weather: weather_profiles(),
            guidance: search_guidance(),
        }
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::italy()
    }
}

fn zone(
    name: &str,
    label: &str,
    bounds: (f64, f64, f64, f64),
    characteristics: ZoneCharacteristics,
    base_probability: TargetTable<i32>,
    common_species: TargetTable<Vec<String>>,
) -> GeoZone {
    GeoZone {
        name: name.to_string(),
        label: label.to_string(),
        bounds: BoundingBox {
            lat_min: bounds.0,
            lat_max: bounds.1,
            lng_min: bounds.2,
            lng_max: bounds.3,
        },
        characteristics,
        base_probability,
        common_species,
        annotations: None,
    }
}

fn characteristics(
    altitude: (i32, i32),
    soil_type: &str,
    forest_density: &str,
    climate: &str,
    moisture_level: &str,
) -> ZoneCharacteristics {
    ZoneCharacteristics {
        altitude: AltitudeRange {
            min: altitude.0,
            max: altitude.1,
        },
        soil_type: soil_type.to_string(),
        forest_density: forest_density.to_string(),
        climate: climate.to_string(),
        moisture_level: moisture_level.to_string(),
        geology: None,
    }
}

fn italian_zones() -> Vec<GeoZone> {
    let mut lessinia = zone(
        "lessinia",
        "Lessinia",
        (45.45, 45.65, 10.85, 11.15),
        ZoneCharacteristics {
            geology: Some("carsico".to_string()),
            ..characteristics((600, 1800), "calcareous_rocky", "mixed_medium", "pre_alpine", "variable")
        },
        TargetTable::full(72, 78, 85, 55),
        TargetTable::lists(
            &["Porcini Estivi", "Gallinacci", "Russule", "Prataioli", "Vescia"],
            &["Tartufo Nero Estivo (Scorzone)", "Tartufo Nero Uncinato"],
            &["Timo Serpillo", "Genzianella", "Carlina", "Achillea", "Origano"],
        ),
    );
    lessinia.annotations = Some(lessinia_annotations());

    vec![
        lessinia,
        zone(
            "northern_italy",
            "Nord Italia",
            (45.0, 46.5, 7.0, 13.0),
            characteristics((100, 1200), "calcareous", "high", "temperate", "optimal"),
            TargetTable::full(75, 82, 68, 50),
            TargetTable::lists(
                &["Porcini", "Finferli", "Chiodini", "Ovoli"],
                &["Tartufo Bianco", "Tartufo Nero", "Scorzone"],
                &["Tarassaco", "Ortica", "Borragine", "Cicoria"],
            ),
        ),
        zone(
            "central_italy",
            "Centro Italia",
            (41.5, 44.5, 8.0, 15.0),
            characteristics((50, 800), "mixed", "medium", "mediterranean", "variable"),
            TargetTable::full(58, 65, 72, 45),
            TargetTable::lists(
                &["Porcini", "Chiodini", "Gallinacci"],
                &["Tartufo Nero", "Scorzone"],
                &["Rucola Selvatica", "Finocchietto", "Malva"],
            ),
        ),
        zone(
            "southern_italy",
            "Sud Italia",
            (36.0, 41.5, 12.0, 18.5),
            characteristics((0, 600), "volcanic", "low", "mediterranean_dry", "low"),
            TargetTable::full(35, 28, 78, 40),
            TargetTable::lists(
                &["Cardoncelli", "Pleurotus"],
                &["Tartufo Nero Estivo"],
                &["Capperi", "Origano", "Rosmarino", "Finocchietto"],
            ),
        ),
        zone(
            "alpine",
            "Regione Alpina",
            (45.5, 47.5, 6.0, 13.0),
            characteristics((800, 2500), "acidic", "high", "alpine", "high"),
            TargetTable::full(85, 45, 88, 55),
            TargetTable::lists(
                &["Porcini", "Finferli", "Russule", "Lactarius"],
                &["Tartufo Nero"],
                &["Genziana", "Stella Alpina", "Timo Selvatico"],
            ),
        ),
    ]
}

fn lessinia_annotations() -> ZoneAnnotations {
    ZoneAnnotations {
        headline: "LESSINIA".to_string(),
        hotspots: TargetTable {
            funghi: Some(strings(&[
                "Bosco del Cansiglio",
                "versanti nord di Corna Piana",
                "boschi attorno a Malga Lessinia",
            ])),
            tartufi: Some(strings(&[
                "Valle delle Sfingi",
                "doline presso Malga San Giorgio",
                "boschi verso Cerna",
            ])),
            ..TargetTable::default()
        },
        search_indicators: TargetTable::lists(
            &[
                "Boschi di faggio tra 800-1300m di quota",
                "Terreno umido ma non fradicio dopo piogge",
                "Zone ombreggiate e fresche in estate",
                "Presenza di humus e foglie in decomposizione",
                "Muschi e felci nelle vicinanze",
                "Pendii esposti a nord o nord-est",
            ],
            &[
                "Doline carsiche con accumulo di terra",
                "Boschi misti faggio-carpino-nocciolo",
                "Terreno calcareo-marnoso ben drenato",
                "Affioramenti rocciosi nelle vicinanze",
                "Zone con escursione termica giorno/notte",
                "Assenza di vegetazione erbacea fitta sotto gli alberi",
            ],
            &[
                "Prati e radure tra 600-1500m",
                "Terreno calcareo ben esposto al sole",
                "Bordi di sentieri e mulattiere",
                "Zone non troppo umide",
                "Presenza di altre piante aromatiche",
                "Pascoli montani abbandonati",
            ],
        ),
        missing_indicators: "Indicatori specifici per Lessinia non definiti".to_string(),
        seasonal_guides: vec![
            SeasonalGuide {
                target: Target::Tartufi,
                season: Season::Summer,
                description: "🎯 ZONA E STAGIONE OTTIMALI per Tartufo Nero Estivo (Scorzone)! \
                    La Lessinia in agosto è il periodo di MASSIMA maturazione. \
                    Terreno calcareo-carsico ideale, altitudine {altitude_min}-{altitude_max}m perfetta. "
                    .to_string(),
                suggestions: "Concentrati sulle DOLINE CARSICHE tra Bosco Chiesanuova ed Erbezzo. \
                    Cerca sotto noccioli e carpini in boschi misti. \
                    Le zone migliori sono: {hotspots}. \
                    Orario ottimale: prima mattina dopo notti fresche."
                    .to_string(),
                suggestions_min_probability: 70,
                optimal: true,
            },
            SeasonalGuide {
                target: Target::Funghi,
                season: Season::Summer,
                description: "🍄 Condizioni discrete per funghi estivi. \
                    In Lessinia ad agosto trova principalmente: \
                    Porcini Estivi (Boletus reticulatus) nei boschi di faggio 800-1200m, \
                    Gallinacci (Cantharellus) nelle conifere, Russule nelle radure. "
                    .to_string(),
                suggestions: "Esplora boschi di FAGGIO tra 800-1300m di quota. \
                    Dopo temporali estivi controlla zone ombreggiate e fresche. \
                    Zone consigliate: {hotspots}."
                    .to_string(),
                suggestions_min_probability: 60,
                optimal: false,
            },
        ],
        seasonal_species: vec![SeasonalSpecies {
            season: Season::Summer,
            species: TargetTable::lists(
                &[
                    "Porcini Estivi",
                    "Gallinacci",
                    "Russule",
                    "Prataioli di Montagna",
                    "Vescia",
                ],
                &["Scorzone (Tartufo Nero Estivo)", "Tartufo Nero Uncinato"],
                &[
                    "Timo Serpillo",
                    "Genzianella",
                    "Achillea",
                    "Carlina",
                    "Origano Montano",
                ],
            ),
        }],
    }
}

fn season_profiles() -> Vec<SeasonProfile> {
    vec![
        SeasonProfile {
            season: Season::Spring,
            modifiers: TargetTable::full(-10, 15, 25, 5),
            peak_species: TargetTable::lists(
                &["Morchelle", "Spugnole"],
                &["Tartufo Nero Pregiato", "Bianchetto"],
                &["Tarassaco", "Ortica Giovane", "Borragine"],
            ),
        },
        SeasonProfile {
            season: Season::Summer,
            modifiers: TargetTable::full(-10, 20, 15, 0),
            peak_species: TargetTable::lists(
                &["Porcini Estivi", "Gallinacci", "Russule", "Prataioli di Montagna"],
                &["Scorzone (Tartufo Nero Estivo)", "Tartufo Nero Uncinato"],
                &["Origano", "Timo", "Maggiorana", "Achillea"],
            ),
        },
        SeasonProfile {
            season: Season::Autumn,
            modifiers: TargetTable::full(30, 25, 5, 15),
            peak_species: TargetTable::lists(
                &["Porcini", "Finferli", "Chiodini", "Ovoli"],
                &["Tartufo Bianco", "Tartufo Nero"],
                &["Rosa Canina", "Bacche di Sambuco"],
            ),
        },
        SeasonProfile {
            season: Season::Winter,
            modifiers: TargetTable::full(-25, -15, -20, -10),
            peak_species: TargetTable::lists(
                &["Orecchioni", "Funghi su Legno"],
                &["Tartufo Nero Invernale"],
                &["Rosmarino", "Alloro"],
            ),
        },
    ]
}

fn weather_profiles() -> Vec<WeatherProfile> {
    let profile = |condition: WeatherCondition, description: &str, modifiers: TargetTable<i32>| {
        WeatherProfile {
            condition,
            description: description.to_string(),
            modifiers,
        }
    };
    vec![
        profile(WeatherCondition::Sunny, "Sole", TargetTable::full(-15, -10, 10, 0)),
        profile(WeatherCondition::Cloudy, "Nuvoloso", TargetTable::full(5, 8, 5, 0)),
        profile(WeatherCondition::Rainy, "Pioggia", TargetTable::full(20, 15, -5, 5)),
        profile(WeatherCondition::Foggy, "Nebbia", TargetTable::full(25, 20, -10, 10)),
        profile(WeatherCondition::Windy, "Ventoso", TargetTable::full(-8, -5, -8, -5)),
    ]
}

fn search_guidance() -> SearchGuidance {
    SearchGuidance {
        optimal_trees: TargetTable {
            funghi: Some("castagni, faggi, querce".to_string()),
            tartufi: Some("querce, noccioli, tigli, pioppi".to_string()),
            erbe: Some("radure e bordi bosco".to_string()),
            custom: None,
        },
        default_trees: "vegetazione mista".to_string(),
        search_hints: TargetTable {
            funghi: Some("muschio, foglie decomposte, terreno soffice".to_string()),
            tartufi: Some("terreno calcareo, radici superficiali, zone brulle".to_string()),
            erbe: Some("terreno ricco, esposizione solare, biodiversità".to_string()),
            custom: None,
        },
        default_hint: "indicatori vari".to_string(),
        search_indicators: TargetTable::lists(
            &[
                "Terreno soffice con foglie in decomposizione",
                "Presenza di muschio",
                "Umidità costante ma non ristagno",
                "Alberi di castagno, faggio o quercia",
                "Assenza di erba fitta",
            ],
            &[
                "Terreno calcareo-argilloso",
                "Radici superficiali di quercia/nocciolo",
                "Assenza di vegetazione sotto l'albero",
                "Terreno compatto ma non duro",
                "Microclima riparato",
            ],
            &[
                "Terreno ricco di humus",
                "Esposizione parziale al sole",
                "Presenza di altre erbe spontanee",
                "Terreno non inquinato",
                "Vicinanza a fonti d'acqua",
            ],
        ),
        missing_indicators: "Indicatori specifici non definiti".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_italy_tables_are_consistent() {
        let italy = ReferenceData::italy();
        let rebuilt = ReferenceData::new(
            italy.zones().to_vec(),
            "central_italy",
            season_profiles(),
            weather_profiles(),
            search_guidance(),
        )
        .unwrap();
        assert_eq!(rebuilt, italy);
    }

    #[test]
    fn test_classify_zone_first_match_wins() {
        let italy = ReferenceData::italy();
        // inside both lessinia and northern_italy
        assert_eq!(italy.classify_zone(45.55, 10.95).name, "lessinia");
        // inside both northern_italy and alpine
        assert_eq!(italy.classify_zone(45.8, 9.0).name, "northern_italy");
        assert_eq!(italy.classify_zone(47.0, 11.0).name, "alpine");
        assert_eq!(italy.classify_zone(40.8, 14.2).name, "southern_italy");
    }

    #[test]
    fn test_classify_zone_falls_back_to_default() {
        let italy = ReferenceData::italy();
        assert_eq!(italy.classify_zone(48.85, 2.35).name, "central_italy");
        assert_eq!(italy.classify_zone(0.0, 0.0).label, "Centro Italia");
    }

    #[test]
    fn test_missing_season_is_rejected() {
        let mut seasons = season_profiles();
        seasons.retain(|s| s.season != Season::Winter);
        let err = ReferenceData::new(
            italian_zones(),
            "central_italy",
            seasons,
            weather_profiles(),
            search_guidance(),
        )
        .unwrap_err();
        assert_eq!(err, ReferenceError::MissingSeason(Season::Winter));
    }

    #[test]
    fn test_unknown_default_zone_is_rejected() {
        let err = ReferenceData::new(
            italian_zones(),
            "atlantis",
            season_profiles(),
            weather_profiles(),
            search_guidance(),
        )
        .unwrap_err();
        assert_eq!(err, ReferenceError::UnknownDefaultZone("atlantis".into()));
    }

    #[test]
    fn test_weather_and_season_lookups() {
        let italy = ReferenceData::italy();
        assert_eq!(italy.weather_profile(WeatherCondition::Foggy).description, "Nebbia");
        assert_eq!(
            italy.season_profile(Season::Winter).modifiers.get(&Target::Funghi),
            Some(&-25)
        );
        assert_eq!(italy.guidance().trees_for(&Target::Custom), "vegetazione mista");
    }
}
