//! Common types used across the platform

use serde::{Deserialize, Serialize};
use std::fmt;

/// GPS coordinates in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub lat: f64,
    pub lon: f64,
}

impl GpsCoordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// What the user is looking for.
///
/// The four known categories have their own reference tables. Any other
/// string is kept verbatim and scored against the generic defaults.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Target {
    Funghi,
    Tartufi,
    Erbe,
    Custom,
    Other(String),
}

impl Target {
    pub fn as_str(&self) -> &str {
        match self {
            Target::Funghi => "funghi",
            Target::Tartufi => "tartufi",
            Target::Erbe => "erbe",
            Target::Custom => "custom",
            Target::Other(raw) => raw,
        }
    }

    /// Italian name used in generated text
    pub fn display_name(&self) -> &str {
        match self {
            Target::Funghi => "funghi",
            Target::Tartufi => "tartufi",
            Target::Erbe => "erbe medicinali",
            Target::Custom => "target personalizzato",
            Target::Other(raw) => raw,
        }
    }
}

impl From<String> for Target {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "funghi" => Target::Funghi,
            "tartufi" => Target::Tartufi,
            "erbe" => Target::Erbe,
            "custom" => Target::Custom,
            _ => Target::Other(raw.trim().to_string()),
        }
    }
}

impl From<&str> for Target {
    fn from(raw: &str) -> Self {
        Target::from(raw.to_string())
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.as_str().to_string()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value per known target category; `Other` targets never match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetTable<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funghi: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tartufi: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erbe: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<T>,
}

impl<T> Default for TargetTable<T> {
    fn default() -> Self {
        Self {
            funghi: None,
            tartufi: None,
            erbe: None,
            custom: None,
        }
    }
}

impl<T> TargetTable<T> {
    pub fn get(&self, target: &Target) -> Option<&T> {
        match target {
            Target::Funghi => self.funghi.as_ref(),
            Target::Tartufi => self.tartufi.as_ref(),
            Target::Erbe => self.erbe.as_ref(),
            Target::Custom => self.custom.as_ref(),
            Target::Other(_) => None,
        }
    }
}

impl TargetTable<i32> {
    /// Table with an entry for every known category
    pub fn full(funghi: i32, tartufi: i32, erbe: i32, custom: i32) -> Self {
        Self {
            funghi: Some(funghi),
            tartufi: Some(tartufi),
            erbe: Some(erbe),
            custom: Some(custom),
        }
    }
}

impl TargetTable<Vec<String>> {
    /// Species/indicator lists for the three natural categories
    pub fn lists(funghi: &[&str], tartufi: &[&str], erbe: &[&str]) -> Self {
        Self {
            funghi: Some(strings(funghi)),
            tartufi: Some(strings(tartufi)),
            erbe: Some(strings(erbe)),
            custom: None,
        }
    }
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Rounds half-way cases towards positive infinity.
///
/// Matches the rounding used by the browser client, so zone hashes and
/// percentages agree between server and WASM builds.
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    // + 0.0 turns -0.0 into 0.0 so it never prints as "-0"
    (value * factor + 0.5).floor() / factor + 0.0
}

/// Integer percentage of `part` over `total`; 0 for an empty total
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    round_half_up(part as f64 / total as f64 * 100.0, 0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!(Target::from("funghi"), Target::Funghi);
        assert_eq!(Target::from(" Tartufi "), Target::Tartufi);
        assert_eq!(Target::from("ERBE"), Target::Erbe);
        assert_eq!(Target::from("custom"), Target::Custom);
        assert_eq!(Target::from("asparagi"), Target::Other("asparagi".into()));
    }

    #[test]
    fn test_target_serde_round_trip() {
        let json = serde_json::to_string(&Target::Tartufi).unwrap();
        assert_eq!(json, "\"tartufi\"");
        let other: Target = serde_json::from_str("\"lamponi\"").unwrap();
        assert_eq!(other.display_name(), "lamponi");
    }

    #[test]
    fn test_target_table_other_never_matches() {
        let table = TargetTable::full(1, 2, 3, 4);
        assert_eq!(table.get(&Target::Erbe), Some(&3));
        assert_eq!(table.get(&Target::Other("funghi secchi".into())), None);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(10.9585, 3), 10.959);
        assert_eq!(round_half_up(-0.0004, 3), 0.0);
        assert_eq!(round_half_up(2.5, 0), 3.0);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
    }
}
