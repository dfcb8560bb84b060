//! Analysis text, suggestions, species and indicators

use crate::models::{GeoZone, SeasonProfile, WeatherProfile};
use crate::reference::SearchGuidance;
use crate::types::Target;

/// Probability band selecting the wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityBand {
    Favorable,
    Moderate,
    Unfavorable,
}

impl ProbabilityBand {
    pub fn of(probability: u8) -> Self {
        if probability >= 70 {
            ProbabilityBand::Favorable
        } else if probability >= 40 {
            ProbabilityBand::Moderate
        } else {
            ProbabilityBand::Unfavorable
        }
    }
}

/// Text part of a scan result
#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
    pub analysis: String,
    pub suggestions: String,
    pub species: Vec<String>,
    pub indicators: Vec<String>,
}

pub struct NarrativeInput<'a> {
    pub zone: &'a GeoZone,
    pub target: &'a Target,
    pub season: &'a SeasonProfile,
    pub weather: &'a WeatherProfile,
    pub guidance: &'a SearchGuidance,
    pub probability: u8,
}

pub fn compose(input: &NarrativeInput<'_>) -> Narrative {
    let NarrativeInput {
        zone,
        target,
        season,
        weather,
        guidance,
        probability,
    } = *input;

    let mut analysis = String::new();
    let mut suggestions = String::new();
    let mut optimal = false;

    match &zone.annotations {
        Some(notes) => {
            analysis.push_str(&format!(
                "🏔️ Analisi {} per {}. ",
                notes.headline,
                target.display_name()
            ));
            if let Some(guide) = notes.guide_for(target, season.season) {
                analysis.push_str(
                    &guide
                        .description
                        .replace("{altitude_min}", &zone.characteristics.altitude.min.to_string())
                        .replace("{altitude_max}", &zone.characteristics.altitude.max.to_string()),
                );
                optimal = guide.optimal;
                if probability >= guide.suggestions_min_probability {
                    let hotspots = notes
                        .hotspots
                        .get(target)
                        .map(|spots| spots.join(", "))
                        .unwrap_or_default();
                    suggestions = guide.suggestions.replace("{hotspots}", &hotspots);
                }
            }
        }
        None => analysis.push_str(&format!(
            "Analisi per {} nella zona {}. ",
            target.display_name(),
            zone.label
        )),
    }

    analysis.push_str(&format!(
        "Stagione {} con condizioni {}. ",
        season.season.label_it(),
        weather.description.to_lowercase()
    ));

    match ProbabilityBand::of(probability) {
        ProbabilityBand::Favorable => {
            if !optimal {
                analysis.push_str("🎯 Condizioni OTTIME! ");
            }
            analysis.push_str("La zona presenta caratteristiche ideali per il target selezionato.");
            if suggestions.is_empty() {
                suggestions = format!(
                    "Esplora aree sotto {}. Cerca segni di {}.",
                    guidance.trees_for(target),
                    guidance.hint_for(target)
                );
            }
        }
        ProbabilityBand::Moderate => {
            analysis.push_str(
                "⚠️ Condizioni MEDIE. La zona ha potenziale ma alcuni fattori limitano la probabilità.",
            );
            if suggestions.is_empty() {
                suggestions = "Prova aree più protette o con microclima favorevole. \
                    Cerca indicatori specifici."
                    .to_string();
            }
        }
        ProbabilityBand::Unfavorable => {
            analysis.push_str("❌ Condizioni SFAVOREVOLI per questo target nella zona attuale.");
            if suggestions.is_empty() {
                suggestions =
                    "Considera di esplorare zone diverse o attendere condizioni più favorevoli."
                        .to_string();
            }
        }
    }

    Narrative {
        analysis,
        suggestions,
        species: likely_species(zone, target, season),
        indicators: search_indicators(zone, target, guidance),
    }
}

/// Zone-season override, then season peaks, then zone common species
pub fn likely_species(zone: &GeoZone, target: &Target, season: &SeasonProfile) -> Vec<String> {
    if let Some(table) = zone
        .annotations
        .as_ref()
        .and_then(|notes| notes.species_for(season.season))
    {
        return table.get(target).cloned().unwrap_or_default();
    }
    season
        .peak_species
        .get(target)
        .or_else(|| zone.common_species.get(target))
        .cloned()
        .unwrap_or_default()
}

/// Detailed indicators, zone-specific for annotated zones
pub fn search_indicators(zone: &GeoZone, target: &Target, guidance: &SearchGuidance) -> Vec<String> {
    let (table, missing) = match &zone.annotations {
        Some(notes) => (&notes.search_indicators, &notes.missing_indicators),
        None => (&guidance.search_indicators, &guidance.missing_indicators),
    };
    table
        .get(target)
        .cloned()
        .unwrap_or_else(|| vec![missing.clone()])
}
