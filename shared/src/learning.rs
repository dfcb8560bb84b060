//! Feedback-driven zone weight updates
//!
//! Each observation nudges the elevation, weather and season weights of its
//! zone by small fixed steps and overwrites the zone bias with the latest
//! outcome.

use chrono::{DateTime, Utc};

use crate::models::{FeedbackRecord, Season, ZoneWeights};

/// Elevation band considered favorable, meters, inclusive
pub const OPTIMAL_ELEVATION: (f64, f64) = (200.0, 1500.0);

const AGREE_STEP: f64 = 0.1;
const DISAGREE_STEP: f64 = -0.05;

/// 100 when the prediction fell on the side of 50 matching the outcome
pub fn compute_accuracy(predicted: f64, found: bool) -> i32 {
    if (predicted > 50.0) == found {
        100
    } else {
        0
    }
}

/// Rain, humidity or cloud cover mentioned in the description
pub fn is_favorable_weather(description: &str) -> bool {
    let w = description.to_lowercase();
    w.contains("pioggia") || w.contains("umid") || w.contains("nuvol")
}

fn agreement_step(predictor: bool, found: bool) -> f64 {
    if predictor == found {
        AGREE_STEP
    } else {
        DISAGREE_STEP
    }
}

/// Missing elevation leaves the weight unchanged
pub fn elevation_nudge(elevation: Option<f64>, found: bool) -> f64 {
    match elevation {
        Some(meters) => {
            let optimal = meters >= OPTIMAL_ELEVATION.0 && meters <= OPTIMAL_ELEVATION.1;
            agreement_step(optimal, found)
        }
        None => 0.0,
    }
}

/// Missing or empty description leaves the weight unchanged
pub fn weather_nudge(description: Option<&str>, found: bool) -> f64 {
    match description.filter(|d| !d.is_empty()) {
        Some(d) => agreement_step(is_favorable_weather(d), found),
        None => 0.0,
    }
}

pub fn season_nudge(season: Season, found: bool) -> f64 {
    match (season, found) {
        (Season::Autumn, true) => 0.15,
        (Season::Autumn, false) => -0.10,
        (Season::Spring, true) => 0.10,
        (Season::Spring, false) => -0.05,
        _ => 0.05,
    }
}

/// Change produced by one feedback record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightDelta {
    pub elevation: f64,
    pub weather: f64,
    pub season: f64,
    /// Replaces the stored bias
    pub zone_bias: f64,
}

impl WeightDelta {
    pub fn for_record(record: &FeedbackRecord) -> Self {
        Self {
            elevation: elevation_nudge(record.elevation, record.found),
            weather: weather_nudge(record.weather_description.as_deref(), record.found),
            season: season_nudge(record.season, record.found),
            zone_bias: if record.found { 1.0 } else { -1.0 },
        }
    }
}

/// Folds a record into its zone row, creating the row on first feedback
pub fn apply_feedback(
    existing: Option<ZoneWeights>,
    record: &FeedbackRecord,
    now: DateTime<Utc>,
) -> ZoneWeights {
    let delta = WeightDelta::for_record(record);
    match existing {
        Some(mut weights) => {
            weights.elevation_weight += delta.elevation;
            weights.weather_weight += delta.weather;
            weights.season_weight += delta.season;
            weights.zone_bias = delta.zone_bias;
            weights.sample_count += 1;
            weights.last_updated = now;
            weights
        }
        None => ZoneWeights {
            zone_hash: record.zone_hash.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            elevation_weight: delta.elevation,
            weather_weight: delta.weather,
            season_weight: delta.season,
            zone_bias: delta.zone_bias,
            sample_count: 1,
            created_at: now,
            last_updated: now,
        },
    }
}

/// Percentage of accurate records; `None` for an empty zone
pub fn zone_accuracy<'a>(records: impl IntoIterator<Item = &'a FeedbackRecord>) -> Option<f64> {
    let (accurate, total) = records
        .into_iter()
        .fold((0usize, 0usize), |(accurate, total), r| {
            (accurate + usize::from(r.is_accurate()), total + 1)
        });
    if total == 0 {
        None
    } else {
        Some(accurate as f64 / total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feedback;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 5, 18, 0, 0).unwrap()
    }

    fn record(found: bool, predicted: f64, elevation: Option<f64>, weather: Option<&str>) -> FeedbackRecord {
        FeedbackRecord::from_feedback(
            Feedback {
                scan_id: Uuid::new_v4().to_string(),
                found,
                predicted,
                latitude: 45.5612,
                longitude: 11.0021,
                elevation,
                weather: weather.map(str::to_string),
                analysis: serde_json::Value::Null,
                timestamp: Some("2024-10-05T08:00:00Z".into()),
            },
            Uuid::new_v4(),
            now(),
        )
    }

    #[test]
    fn test_compute_accuracy() {
        assert_eq!(compute_accuracy(80.0, true), 100);
        assert_eq!(compute_accuracy(30.0, false), 100);
        assert_eq!(compute_accuracy(50.0, false), 100);
        assert_eq!(compute_accuracy(50.0, true), 0);
        assert_eq!(compute_accuracy(51.0, false), 0);
    }

    #[test]
    fn test_nudges() {
        assert_eq!(elevation_nudge(Some(900.0), true), 0.1);
        assert_eq!(elevation_nudge(Some(1500.0), false), -0.05);
        assert_eq!(elevation_nudge(Some(2200.0), false), 0.1);
        assert_eq!(elevation_nudge(None, true), 0.0);
        assert_eq!(weather_nudge(Some("Nuvoloso, 12°C"), true), 0.1);
        assert_eq!(weather_nudge(Some("aria umida"), false), -0.05);
        assert_eq!(weather_nudge(Some("sole"), false), 0.1);
        assert_eq!(weather_nudge(Some(""), true), 0.0);
        assert_eq!(season_nudge(Season::Autumn, false), -0.10);
        assert_eq!(season_nudge(Season::Spring, true), 0.10);
        assert_eq!(season_nudge(Season::Winter, false), 0.05);
        assert_eq!(season_nudge(Season::Summer, true), 0.05);
    }

    #[test]
    fn test_first_feedback_creates_row() {
        let first = record(true, 80.0, Some(950.0), Some("pioggia leggera"));
        let weights = apply_feedback(None, &first, now());
        assert_eq!(weights.zone_hash, "45.561,11.002");
        assert_eq!(weights.sample_count, 1);
        assert_eq!(weights.zone_bias, 1.0);
        assert_eq!(weights.elevation_weight, 0.1);
        assert_eq!(weights.weather_weight, 0.1);
        assert_eq!(weights.season_weight, 0.15);
        assert_eq!(weights.created_at, now());
    }

    #[test]
    fn test_second_feedback_overwrites_bias_and_accumulates_nudges() {
        let first = record(true, 80.0, Some(950.0), Some("pioggia leggera"));
        let second = record(false, 30.0, Some(950.0), Some("sole"));
        let weights = apply_feedback(Some(apply_feedback(None, &first, now())), &second, now());
        assert_eq!(weights.sample_count, 2);
        assert_eq!(weights.zone_bias, -1.0);
        assert!((weights.elevation_weight - 0.05).abs() < 1e-12);
        assert!((weights.weather_weight - 0.2).abs() < 1e-12);
        assert!((weights.season_weight - 0.05).abs() < 1e-12);
        assert_eq!(zone_accuracy([&first, &second]), Some(100.0));
    }

    #[test]
    fn test_zone_accuracy_empty_zone() {
        assert_eq!(zone_accuracy(std::iter::empty()), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_accuracy_law(predicted in -10.0f64..110.0, found in any::<bool>()) {
            let accuracy = compute_accuracy(predicted, found);
            prop_assert!(accuracy == 0 || accuracy == 100);
            prop_assert_eq!(accuracy == 100, (predicted > 50.0) == found);
        }

        #[test]
        fn prop_sample_count_tracks_feedback(
            outcomes in prop::collection::vec((any::<bool>(), 0.0f64..100.0, prop::option::of(0.0f64..3000.0)), 1..40)
        ) {
            let mut weights = None;
            for (found, predicted, elevation) in &outcomes {
                let r = record(*found, *predicted, *elevation, Some("nuvoloso"));
                weights = Some(apply_feedback(weights, &r, now()));
            }
            let weights = weights.unwrap();
            prop_assert_eq!(weights.sample_count, outcomes.len() as i64);
            let last_found = outcomes.last().map(|o| o.0).unwrap();
            prop_assert_eq!(weights.zone_bias, if last_found { 1.0 } else { -1.0 });
        }
    }
}
