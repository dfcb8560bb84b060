//! Season models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::TargetTable;

/// Calendar season bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    /// Also the fallback when a timestamp cannot be read
    #[default]
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    /// Season of a calendar month (1-12); anything else maps to the default
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            12 | 1 | 2 => Season::Winter,
            _ => Season::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }

    /// Italian name used in generated text
    pub fn label_it(&self) -> &'static str {
        match self {
            Season::Spring => "primavera",
            Season::Summer => "estate",
            Season::Autumn => "autunno",
            Season::Winter => "inverno",
        }
    }

    pub fn months(&self) -> [u32; 3] {
        match self {
            Season::Spring => [3, 4, 5],
            Season::Summer => [6, 7, 8],
            Season::Autumn => [9, 10, 11],
            Season::Winter => [12, 1, 2],
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" | "primavera" => Ok(Season::Spring),
            "summer" | "estate" => Ok(Season::Summer),
            "autumn" | "autunno" => Ok(Season::Autumn),
            "winter" | "inverno" => Ok(Season::Winter),
            other => Err(format!("unknown season: {}", other)),
        }
    }
}

/// Per-target modifiers and peak species of a season
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonProfile {
    pub season: Season,
    pub modifiers: TargetTable<i32>,
    pub peak_species: TargetTable<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_month_has_one_season() {
        for month in 1..=12 {
            let season = Season::from_month(month);
            let owners: Vec<_> = Season::ALL
                .iter()
                .filter(|s| s.months().contains(&month))
                .collect();
            assert_eq!(owners, vec![&season], "month {}", month);
        }
    }

    #[test]
    fn test_out_of_range_month_defaults_to_autumn() {
        assert_eq!(Season::from_month(0), Season::Autumn);
        assert_eq!(Season::from_month(13), Season::Autumn);
    }

    #[test]
    fn test_season_parses_italian_labels() {
        assert_eq!("Autunno".parse::<Season>(), Ok(Season::Autumn));
        assert_eq!("winter".parse::<Season>(), Ok(Season::Winter));
        assert!("monsone".parse::<Season>().is_err());
    }
}
