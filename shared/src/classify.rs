//! Zone hash, season and weather classification

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use rand::{Rng, RngCore};

use crate::models::{Season, WeatherCategory, WeatherCondition};
use crate::types::round_half_up;

/// Grid-cell key of a point: both coordinates rounded to 3 decimals
pub fn zone_hash(lat: f64, lon: f64) -> String {
    format!("{},{}", round_half_up(lat, 3), round_half_up(lon, 3))
}

/// Parses RFC 3339, a naive ISO date-time (read as UTC) or a bare date
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Season of a timestamp.
///
/// A missing timestamp means `now`; one that cannot be parsed yields the
/// default season instead of an error.
pub fn classify_season(timestamp: Option<&str>, now: DateTime<Utc>) -> Season {
    match timestamp {
        None => Season::from_month(now.month()),
        Some(raw) => parse_timestamp(raw)
            .map(|dt| Season::from_month(dt.month()))
            .unwrap_or_default(),
    }
}

/// Maps a provider description onto the scoring enumeration.
///
/// Case-insensitive substring match; the first rule that hits wins, so
/// "temporale con nuvole" is rainy.
pub fn weather_from_description(description: &str) -> Option<WeatherCondition> {
    const RULES: [(&[&str], WeatherCondition); 5] = [
        (&["pioggia", "temporale"], WeatherCondition::Rainy),
        (&["nuvol"], WeatherCondition::Cloudy),
        (&["sole", "sereno"], WeatherCondition::Sunny),
        (&["nebbia"], WeatherCondition::Foggy),
        (&["vento"], WeatherCondition::Windy),
    ];
    let lower = description.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, condition)| *condition)
}

/// Coarse category stored with feedback
pub fn categorize_weather(description: Option<&str>) -> WeatherCategory {
    let Some(description) = description.filter(|d| !d.is_empty()) else {
        return WeatherCategory::Unknown;
    };
    let w = description.to_lowercase();
    if w.contains("pioggia") || w.contains("temporale") {
        WeatherCategory::Rainy
    } else if w.contains("nuvol") {
        WeatherCategory::Cloudy
    } else if w.contains("sole") {
        WeatherCategory::Sunny
    } else if w.contains("nebbia") {
        WeatherCategory::Foggy
    } else {
        WeatherCategory::Other
    }
}

/// Probability of each condition in a season, in declaration order
pub fn weather_distribution(season: Season) -> [(WeatherCondition, f64); 5] {
    let (sunny, rainy, foggy) = match season {
        Season::Autumn => (0.2, 0.4, 0.2),
        Season::Summer => (0.5, 0.1, 0.1),
        Season::Spring | Season::Winter => (0.3, 0.2, 0.1),
    };
    [
        (WeatherCondition::Sunny, sunny),
        (WeatherCondition::Cloudy, 0.3),
        (WeatherCondition::Rainy, rainy),
        (WeatherCondition::Foggy, foggy),
        (WeatherCondition::Windy, 0.1),
    ]
}

/// Draws a condition when no weather feed is available.
///
/// Autumn weights sum above 1 and summer below it; the cumulative walk
/// falls back to cloudy when the draw overruns.
pub fn sample_weather(season: Season, rng: &mut dyn RngCore) -> WeatherCondition {
    let draw: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (condition, p) in weather_distribution(season) {
        cumulative += p;
        if draw <= cumulative {
            return condition;
        }
    }
    WeatherCondition::Cloudy
}
