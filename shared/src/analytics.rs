//! Read-only aggregates over the feedback log and zone weights
//!
//! Everything here is re-derivable from the stored records at any time.
//! Groups keep first-encountered order and every ranking uses a stable sort,
//! so ties are reported in log order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FeedbackRecord, ZoneWeights};
use crate::types::{percent, round_half_up, GpsCoordinates};

/// Zones need this many samples to be ranked by success rate
pub const MIN_RANKED_SAMPLES: usize = 3;
/// Length of every zone ranking
pub const RANKING_LIMIT: usize = 10;

/// Elevation bands as `(label, min inclusive, max exclusive)`
pub const ELEVATION_BANDS: [(&str, f64, f64); 4] = [
    ("0-200m", 0.0, 200.0),
    ("200-800m", 200.0, 800.0),
    ("800-1500m", 800.0, 1500.0),
    ("1500m+", 1500.0, 10000.0),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub summary: Summary,
    pub trends: Trends,
    pub zones: ZoneRankings,
    pub ml_status: MlStatus,
}

impl Analytics {
    pub fn with_total_scans(mut self, total_scans: usize) -> Self {
        self.summary.total_scans = total_scans;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_feedback: usize,
    pub total_scans: usize,
    pub total_zones: usize,
    pub overall_accuracy: u32,
    pub success_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub accuracy_trend: Vec<DailyAccuracy>,
    pub activity_trend: Vec<DailyActivity>,
    pub weather_performance: Vec<PerformanceBucket>,
    pub elevation_performance: Vec<PerformanceBucket>,
    pub seasonal_performance: Vec<PerformanceBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyAccuracy {
    pub date: NaiveDate,
    pub accuracy: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: usize,
}

/// Success rate of one group (weather category, elevation band, season)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceBucket {
    pub label: String,
    pub success_rate: u32,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRankings {
    pub top_performing_zones: Vec<ZoneRanking>,
    pub low_performing_zones: Vec<ZoneRanking>,
    pub most_active_zones: Vec<ZoneRanking>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRanking {
    pub zone: String,
    /// Absent in the activity ranking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<u32>,
    pub total: usize,
    /// Location of the first record seen in the zone
    pub coordinates: GpsCoordinates,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MlStatus {
    pub total_weights: usize,
    /// Zones with more than two samples
    pub active_zones: usize,
    pub average_zone_bias: f64,
    pub last_model_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total: usize,
    found: usize,
    accurate: usize,
}

impl Tally {
    fn add(&mut self, record: &FeedbackRecord) {
        self.total += 1;
        self.found += usize::from(record.found);
        self.accurate += usize::from(record.is_accurate());
    }

    fn success_rate(&self) -> u32 {
        percent(self.found, self.total)
    }
}

/// Groups records by key in first-encountered order
fn tally_by<'a, K, F>(feedback: &'a [FeedbackRecord], key: F) -> Vec<(K, Tally, &'a FeedbackRecord)>
where
    K: PartialEq,
    F: Fn(&FeedbackRecord) -> K,
{
    let mut groups: Vec<(K, Tally, &FeedbackRecord)> = Vec::new();
    for record in feedback {
        let k = key(record);
        match groups.iter_mut().find(|(existing, _, _)| *existing == k) {
            Some((_, tally, _)) => tally.add(record),
            None => {
                let mut tally = Tally::default();
                tally.add(record);
                groups.push((k, tally, record));
            }
        }
    }
    groups
}

pub fn calculate_overall_accuracy(feedback: &[FeedbackRecord]) -> u32 {
    percent(feedback.iter().filter(|r| r.is_accurate()).count(), feedback.len())
}

pub fn calculate_success_rate(feedback: &[FeedbackRecord]) -> u32 {
    percent(feedback.iter().filter(|r| r.found).count(), feedback.len())
}

pub fn calculate_accuracy_trend(feedback: &[FeedbackRecord]) -> Vec<DailyAccuracy> {
    let mut trend: Vec<DailyAccuracy> = tally_by(feedback, |r| r.timestamp.date_naive())
        .into_iter()
        .map(|(date, tally, _)| DailyAccuracy {
            date,
            accuracy: percent(tally.accurate, tally.total),
        })
        .collect();
    trend.sort_by_key(|d| d.date);
    trend
}

pub fn calculate_activity_trend(feedback: &[FeedbackRecord]) -> Vec<DailyActivity> {
    let mut trend: Vec<DailyActivity> = tally_by(feedback, |r| r.timestamp.date_naive())
        .into_iter()
        .map(|(date, tally, _)| DailyActivity {
            date,
            count: tally.total,
        })
        .collect();
    trend.sort_by_key(|d| d.date);
    trend
}

pub fn calculate_weather_performance(feedback: &[FeedbackRecord]) -> Vec<PerformanceBucket> {
    tally_by(feedback, |r| r.weather_category)
        .into_iter()
        .map(|(category, tally, _)| PerformanceBucket {
            label: category.to_string(),
            success_rate: tally.success_rate(),
            total: tally.total,
        })
        .collect()
}

/// Every band is reported, empty ones with a zero rate.
///
/// Missing elevations count as 0 m; values outside all bands are skipped.
pub fn calculate_elevation_performance(feedback: &[FeedbackRecord]) -> Vec<PerformanceBucket> {
    let mut tallies = [Tally::default(); ELEVATION_BANDS.len()];
    for record in feedback {
        let elevation = record.elevation.unwrap_or(0.0);
        if let Some(band) = ELEVATION_BANDS
            .iter()
            .position(|(_, min, max)| elevation >= *min && elevation < *max)
        {
            tallies[band].add(record);
        }
    }
    ELEVATION_BANDS
        .iter()
        .zip(tallies)
        .map(|((label, _, _), tally)| PerformanceBucket {
            label: label.to_string(),
            success_rate: tally.success_rate(),
            total: tally.total,
        })
        .collect()
}

pub fn calculate_seasonal_performance(feedback: &[FeedbackRecord]) -> Vec<PerformanceBucket> {
    tally_by(feedback, |r| r.season)
        .into_iter()
        .map(|(season, tally, _)| PerformanceBucket {
            label: season.to_string(),
            success_rate: tally.success_rate(),
            total: tally.total,
        })
        .collect()
}

fn ranked_zones(feedback: &[FeedbackRecord]) -> Vec<ZoneRanking> {
    tally_by(feedback, |r| r.zone_hash.clone())
        .into_iter()
        .filter(|(_, tally, _)| tally.total >= MIN_RANKED_SAMPLES)
        .map(|(zone, tally, first)| ZoneRanking {
            zone,
            success_rate: Some(tally.success_rate()),
            total: tally.total,
            coordinates: GpsCoordinates::new(first.latitude, first.longitude),
        })
        .collect()
}

pub fn get_top_performing_zones(feedback: &[FeedbackRecord]) -> Vec<ZoneRanking> {
    let mut zones = ranked_zones(feedback);
    zones.sort_by(|a, b| b.success_rate.cmp(&a.success_rate));
    zones.truncate(RANKING_LIMIT);
    zones
}

pub fn get_low_performing_zones(feedback: &[FeedbackRecord]) -> Vec<ZoneRanking> {
    let mut zones = ranked_zones(feedback);
    zones.sort_by(|a, b| a.success_rate.cmp(&b.success_rate));
    zones.truncate(RANKING_LIMIT);
    zones
}

pub fn get_most_active_zones(feedback: &[FeedbackRecord]) -> Vec<ZoneRanking> {
    let mut zones: Vec<ZoneRanking> = tally_by(feedback, |r| r.zone_hash.clone())
        .into_iter()
        .map(|(zone, tally, first)| ZoneRanking {
            zone,
            success_rate: None,
            total: tally.total,
            coordinates: GpsCoordinates::new(first.latitude, first.longitude),
        })
        .collect();
    zones.sort_by(|a, b| b.total.cmp(&a.total));
    zones.truncate(RANKING_LIMIT);
    zones
}

/// Mean zone bias rounded to two decimals; 0 without rows
pub fn calculate_average_zone_bias(weights: &[ZoneWeights]) -> f64 {
    if weights.is_empty() {
        return 0.0;
    }
    let total: f64 = weights.iter().map(|w| w.zone_bias).sum();
    round_half_up(total / weights.len() as f64, 2)
}

pub fn compute_ml_status(weights: &[ZoneWeights]) -> MlStatus {
    MlStatus {
        total_weights: weights.len(),
        active_zones: weights.iter().filter(|w| w.sample_count > 2).count(),
        average_zone_bias: calculate_average_zone_bias(weights),
        last_model_update: weights.iter().map(|w| w.last_updated).max(),
    }
}

/// Full analytics document; scan totals are attached by the caller
pub fn compute_analytics(feedback: &[FeedbackRecord], weights: &[ZoneWeights]) -> Analytics {
    let total_zones = tally_by(feedback, |r| r.zone_hash.clone()).len();
    Analytics {
        summary: Summary {
            total_feedback: feedback.len(),
            total_scans: 0,
            total_zones,
            overall_accuracy: calculate_overall_accuracy(feedback),
            success_rate: calculate_success_rate(feedback),
        },
        trends: Trends {
            accuracy_trend: calculate_accuracy_trend(feedback),
            activity_trend: calculate_activity_trend(feedback),
            weather_performance: calculate_weather_performance(feedback),
            elevation_performance: calculate_elevation_performance(feedback),
            seasonal_performance: calculate_seasonal_performance(feedback),
        },
        zones: ZoneRankings {
            top_performing_zones: get_top_performing_zones(feedback),
            low_performing_zones: get_low_performing_zones(feedback),
            most_active_zones: get_most_active_zones(feedback),
        },
        ml_status: compute_ml_status(weights),
    }
}
