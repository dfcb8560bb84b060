//! Record storage for scans, feedback and zone weights
//!
//! Two backends implement the same traits: [`PgStore`] for PostgreSQL and
//! [`MemoryStore`] for development and tests.

use async_trait::async_trait;
use sniffer_shared::{FeedbackRecord, ScanRecord, ZoneWeights};
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of one committed feedback write
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackReceipt {
    pub feedback_id: Uuid,
    /// Accuracy of the zone including the new record
    pub zone_accuracy: Option<f64>,
    pub weights: ZoneWeights,
}

#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn save_scan(&self, scan: &ScanRecord) -> StoreResult<()>;

    /// Newest first
    async fn list_scans(&self, limit: i64) -> StoreResult<Vec<ScanRecord>>;

    async fn count_scans(&self) -> StoreResult<usize>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Inserts the record and folds it into its zone weights atomically.
    ///
    /// Concurrent writes to the same zone hash never lose an update.
    async fn record_feedback(&self, record: &FeedbackRecord) -> StoreResult<FeedbackReceipt>;

    /// Newest first
    async fn list_feedback(&self, limit: i64) -> StoreResult<Vec<FeedbackRecord>>;

    /// Every record in insertion order
    async fn list_all_feedback(&self) -> StoreResult<Vec<FeedbackRecord>>;

    /// Most recently updated first
    async fn list_weights(&self) -> StoreResult<Vec<ZoneWeights>>;

    async fn get_weights(&self, zone_hash: &str) -> StoreResult<Option<ZoneWeights>>;

    /// Name of the backend and whether it is reachable
    async fn health(&self) -> (&'static str, bool);
}
