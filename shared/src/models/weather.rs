//! Weather models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::TargetTable;

/// Weather enumeration used by the scoring engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Foggy,
    Windy,
}

impl WeatherCondition {
    /// Declaration order; the sampling walk follows it
    pub const ALL: [WeatherCondition; 5] = [
        WeatherCondition::Sunny,
        WeatherCondition::Cloudy,
        WeatherCondition::Rainy,
        WeatherCondition::Foggy,
        WeatherCondition::Windy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WeatherCondition::Sunny => "sunny",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Rainy => "rainy",
            WeatherCondition::Foggy => "foggy",
            WeatherCondition::Windy => "windy",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Modifiers and Italian description of a weather condition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherProfile {
    pub condition: WeatherCondition,
    pub description: String,
    pub modifiers: TargetTable<i32>,
}

/// Coarse weather bucket stored with feedback
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WeatherCategory {
    Rainy,
    Cloudy,
    Sunny,
    Foggy,
    Other,
    /// No description was available
    Unknown,
}

impl WeatherCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCategory::Rainy => "Rainy",
            WeatherCategory::Cloudy => "Cloudy",
            WeatherCategory::Sunny => "Sunny",
            WeatherCategory::Foggy => "Foggy",
            WeatherCategory::Other => "Other",
            WeatherCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WeatherCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Rainy" => Ok(WeatherCategory::Rainy),
            "Cloudy" => Ok(WeatherCategory::Cloudy),
            "Sunny" => Ok(WeatherCategory::Sunny),
            "Foggy" => Ok(WeatherCategory::Foggy),
            "Other" => Ok(WeatherCategory::Other),
            "Unknown" => Ok(WeatherCategory::Unknown),
            other => Err(format!("unknown weather category: {}", other)),
        }
    }
}

/// Current conditions reported by a weather provider (or its fallback)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherReport {
    /// Free text such as `"pioggia leggera, 14°C"`
    pub description: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub condition: Option<String>,
    /// False when the values were simulated
    pub live: bool,
}
