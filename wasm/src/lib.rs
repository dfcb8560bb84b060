//! WebAssembly module for the Sniffer browser client
//!
//! Provides client-side computation for:
//! - Offline scan scoring when the backend is unreachable
//! - Zone hashing and season lookup for queued feedback
//! - Feedback accuracy and weather categorization

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

use sniffer_shared::classify;
use sniffer_shared::learning;
use sniffer_shared::reference::ReferenceData;
use sniffer_shared::scoring::{ScoringContext, ScoringEngine};

// Re-export shared types for use in JavaScript
pub use sniffer_shared::models::*;
pub use sniffer_shared::types::*;

fn engine() -> &'static ScoringEngine {
    static ENGINE: OnceLock<ScoringEngine> = OnceLock::new();
    ENGINE.get_or_init(|| ScoringEngine::new(Arc::new(ReferenceData::italy())))
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&"🧠 Sniffer offline engine ready".into());
}

/// Score a scan without the backend.
///
/// `request_json` uses the same body as `POST /api/v1/analyze`; the optional
/// `weather_description` is the last description seen from the server. A
/// `seed` makes the result reproducible.
#[wasm_bindgen]
pub fn score_scan(
    request_json: &str,
    weather_description: Option<String>,
    seed: Option<u64>,
) -> Result<String, JsValue> {
    let input: ScanInput =
        serde_json::from_str(request_json).map_err(|e| js_error("Invalid scan JSON", e))?;
    let request = sniffer_shared::validate_scan_input(input).map_err(|e| js_error("Invalid scan", e))?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let ctx = ScoringContext {
        weather_description,
        ..ScoringContext::new(Utc::now())
    };
    let result = engine().score(&request, &ctx, &mut rng);
    serde_json::to_string(&result).map_err(|e| js_error("Serialization failed", e))
}

/// Zone hash (`"lat,lon"` rounded to 3 decimals)
#[wasm_bindgen]
pub fn zone_hash(lat: f64, lon: f64) -> String {
    classify::zone_hash(lat, lon)
}

/// Season name (`spring`, `summer`, `autumn`, `winter`) of a 1-12 month
#[wasm_bindgen]
pub fn season_for_month(month: u32) -> String {
    Season::from_month(month).name().to_string()
}

/// Season name of an ISO timestamp; unreadable input gives `autumn`
#[wasm_bindgen]
pub fn season_for_timestamp(timestamp: &str) -> String {
    classify::classify_season(Some(timestamp), Utc::now())
        .name()
        .to_string()
}

/// Weather category stored with feedback (`Rainy`, `Cloudy`, ...)
#[wasm_bindgen]
pub fn categorize_weather(description: Option<String>) -> String {
    classify::categorize_weather(description.as_deref()).to_string()
}

/// 100 when the prediction matched the outcome, else 0
#[wasm_bindgen]
pub fn compute_accuracy(predicted: f64, found: bool) -> i32 {
    learning::compute_accuracy(predicted, found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_hash() {
        assert_eq!(zone_hash(45.5234, 10.9585), "45.523,10.959");
    }

    #[test]
    fn test_season_helpers() {
        assert_eq!(season_for_month(8), "summer");
        assert_eq!(season_for_month(1), "winter");
        assert_eq!(season_for_timestamp("2024-10-01T10:00:00Z"), "autumn");
        assert_eq!(season_for_timestamp("garbage"), "autumn");
    }

    #[test]
    fn test_categorize_weather() {
        assert_eq!(categorize_weather(Some("pioggia intensa, 14°C".into())), "Rainy");
        assert_eq!(categorize_weather(Some("cielo sereno".into())), "Other");
        assert_eq!(categorize_weather(None), "Unknown");
    }

    #[test]
    fn test_compute_accuracy() {
        assert_eq!(compute_accuracy(80.0, true), 100);
        assert_eq!(compute_accuracy(80.0, false), 0);
    }

    #[test]
    fn test_score_scan_is_reproducible_with_seed() {
        let body = r#"{"target":"tartufi","latitude":45.55,"longitude":10.95,"timestamp":"2024-08-14T07:00:00Z"}"#;
        let a = score_scan(body, None, Some(4)).unwrap();
        let b = score_scan(body, None, Some(4)).unwrap();
        let a: serde_json::Value = serde_json::from_str(&a).unwrap();
        let b: serde_json::Value = serde_json::from_str(&b).unwrap();
        assert_eq!(a["probability"], b["probability"]);
        assert_eq!(a["zone"], "lessinia");
        assert_eq!(a["season"], "summer");
    }
}
