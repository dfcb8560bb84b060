//! PostgreSQL store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sniffer_shared::learning::WeightDelta;
use sniffer_shared::{FeedbackRecord, ScanRecord, Season, WeatherCategory, ZoneWeights};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{FeedbackReceipt, FeedbackStore, ScanStore, StoreError, StoreResult};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct ScanRow {
    id: Uuid,
    target: String,
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    weather_description: String,
    probability: i32,
    confidence: i32,
    voc: Option<f64>,
    humidity: Option<f64>,
    zone_hash: String,
    result: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<ScanRow> for ScanRecord {
    fn from(row: ScanRow) -> Self {
        ScanRecord {
            id: row.id,
            target: row.target,
            latitude: row.latitude,
            longitude: row.longitude,
            elevation: row.elevation,
            weather_description: row.weather_description,
            probability: row.probability,
            confidence: row.confidence,
            voc: row.voc,
            humidity: row.humidity,
            zone_hash: row.zone_hash,
            result: row.result,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct FeedbackRow {
    id: Uuid,
    scan_id: String,
    found: bool,
    predicted: f64,
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    weather_description: Option<String>,
    analysis: serde_json::Value,
    timestamp: DateTime<Utc>,
    accuracy: i32,
    zone_hash: String,
    season: String,
    weather_category: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<FeedbackRow> for FeedbackRecord {
    type Error = StoreError;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        let corrupt = |message: String| StoreError::CorruptRow {
            table: "feedback",
            message,
        };
        Ok(FeedbackRecord {
            id: row.id,
            scan_id: row.scan_id,
            found: row.found,
            predicted: row.predicted,
            latitude: row.latitude,
            longitude: row.longitude,
            elevation: row.elevation,
            weather_description: row.weather_description,
            analysis: row.analysis,
            timestamp: row.timestamp,
            accuracy: row.accuracy,
            zone_hash: row.zone_hash,
            season: row.season.parse::<Season>().map_err(corrupt)?,
            weather_category: row
                .weather_category
                .parse::<WeatherCategory>()
                .map_err(corrupt)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct WeightsRow {
    zone_hash: String,
    latitude: f64,
    longitude: f64,
    elevation_weight: f64,
    weather_weight: f64,
    season_weight: f64,
    zone_bias: f64,
    sample_count: i64,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl From<WeightsRow> for ZoneWeights {
    fn from(row: WeightsRow) -> Self {
        ZoneWeights {
            zone_hash: row.zone_hash,
            latitude: row.latitude,
            longitude: row.longitude,
            elevation_weight: row.elevation_weight,
            weather_weight: row.weather_weight,
            season_weight: row.season_weight,
            zone_bias: row.zone_bias,
            sample_count: row.sample_count,
            created_at: row.created_at,
            last_updated: row.last_updated,
        }
    }
}

const FEEDBACK_COLUMNS: &str = "id, scan_id, found, predicted, latitude, longitude, elevation, \
     weather_description, analysis, timestamp, accuracy, zone_hash, season, weather_category, \
     created_at";

const WEIGHTS_COLUMNS: &str = "zone_hash, latitude, longitude, elevation_weight, weather_weight, \
     season_weight, zone_bias, sample_count, created_at, last_updated";

#[async_trait]
impl ScanStore for PgStore {
    async fn save_scan(&self, scan: &ScanRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO scans (
                id, target, latitude, longitude, elevation, weather_description,
                probability, confidence, voc, humidity, zone_hash, result, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(scan.id)
        .bind(&scan.target)
        .bind(scan.latitude)
        .bind(scan.longitude)
        .bind(scan.elevation)
        .bind(&scan.weather_description)
        .bind(scan.probability)
        .bind(scan.confidence)
        .bind(scan.voc)
        .bind(scan.humidity)
        .bind(&scan.zone_hash)
        .bind(&scan.result)
        .bind(scan.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list_scans(&self, limit: i64) -> StoreResult<Vec<ScanRecord>> {
        let rows = sqlx::query_as::<_, ScanRow>(
            r#"
            SELECT id, target, latitude, longitude, elevation, weather_description,
                   probability, confidence, voc, humidity, zone_hash, result, created_at
            FROM scans
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ScanRecord::from).collect())
    }

    async fn count_scans(&self) -> StoreResult<usize> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scans")
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as usize)
    }
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn record_feedback(&self, record: &FeedbackRecord) -> StoreResult<FeedbackReceipt> {
        let delta = WeightDelta::for_record(record);
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO feedback (
                id, scan_id, found, predicted, latitude, longitude, elevation,
                weather_description, analysis, timestamp, accuracy, zone_hash, season,
                weather_category, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(record.id)
        .bind(&record.scan_id)
        .bind(record.found)
        .bind(record.predicted)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.elevation)
        .bind(&record.weather_description)
        .bind(&record.analysis)
        .bind(record.timestamp)
        .bind(record.accuracy)
        .bind(&record.zone_hash)
        .bind(record.season.name())
        .bind(record.weather_category.as_str())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        // The upsert holds the row lock until commit, serializing writers per zone
        let weights = sqlx::query_as::<_, WeightsRow>(&format!(
            r#"
            INSERT INTO zone_weights (
                zone_hash, latitude, longitude, elevation_weight, weather_weight,
                season_weight, zone_bias, sample_count, created_at, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1, NOW(), NOW())
            ON CONFLICT (zone_hash) DO UPDATE SET
                elevation_weight = zone_weights.elevation_weight + EXCLUDED.elevation_weight,
                weather_weight = zone_weights.weather_weight + EXCLUDED.weather_weight,
                season_weight = zone_weights.season_weight + EXCLUDED.season_weight,
                zone_bias = EXCLUDED.zone_bias,
                sample_count = zone_weights.sample_count + 1,
                last_updated = NOW()
            RETURNING {}
            "#,
            WEIGHTS_COLUMNS
        ))
        .bind(&record.zone_hash)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(delta.elevation)
        .bind(delta.weather)
        .bind(delta.season)
        .bind(delta.zone_bias)
        .fetch_one(&mut *tx)
        .await?;

        let accuracy = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(accuracy)::DOUBLE PRECISION FROM feedback WHERE zone_hash = $1",
        )
        .bind(&record.zone_hash)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(FeedbackReceipt {
            feedback_id: record.id,
            zone_accuracy: accuracy,
            weights: weights.into(),
        })
    }

    async fn list_feedback(&self, limit: i64) -> StoreResult<Vec<FeedbackRecord>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {} FROM feedback ORDER BY timestamp DESC LIMIT $1",
            FEEDBACK_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(FeedbackRecord::try_from).collect()
    }

    async fn list_all_feedback(&self) -> StoreResult<Vec<FeedbackRecord>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {} FROM feedback ORDER BY created_at ASC, id ASC",
            FEEDBACK_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(FeedbackRecord::try_from).collect()
    }

    async fn list_weights(&self) -> StoreResult<Vec<ZoneWeights>> {
        let rows = sqlx::query_as::<_, WeightsRow>(&format!(
            "SELECT {} FROM zone_weights ORDER BY last_updated DESC, zone_hash ASC",
            WEIGHTS_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ZoneWeights::from).collect())
    }

    async fn get_weights(&self, zone_hash: &str) -> StoreResult<Option<ZoneWeights>> {
        let row = sqlx::query_as::<_, WeightsRow>(&format!(
            "SELECT {} FROM zone_weights WHERE zone_hash = $1",
            WEIGHTS_COLUMNS
        ))
        .bind(zone_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(ZoneWeights::from))
    }

    async fn health(&self) -> (&'static str, bool) {
        let ok = sqlx::query("SELECT 1").execute(&self.db).await.is_ok();
        ("postgres", ok)
    }
}
