//! Record store seam.
//!
//! The core never talks to a concrete backend directly; everything goes
//! through [`RecordStore`], a minimal select/insert/update interface over
//! the five named collections. `MemoryStore` backs tests and prototyping,
//! `SqliteStore` backs local persistence. Real deployments plug in their
//! own implementation.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    EnvironmentalData,
    CommunityReports,
    Predictions,
    UserActions,
    UserProfiles,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Self::EnvironmentalData,
        Self::CommunityReports,
        Self::Predictions,
        Self::UserActions,
        Self::UserProfiles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnvironmentalData => "environmental_data",
            Self::CommunityReports => "community_reports",
            Self::Predictions => "predictions",
            Self::UserActions => "user_actions",
            Self::UserProfiles => "user_profiles",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Equality-filtered, optionally ordered and limited read.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, value: Value) -> Self {
        self.filters.push((field.to_string(), value));
        self
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by = Some((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("row not found: {0}")]
    NotFound(String),
    #[error("row serialization failure: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Async seam to the record store. Every call suspends until the backend
/// responds; timeout policy belongs to the implementation, not the core.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, collection: Collection, query: Query) -> StoreResult<Vec<Value>>;

    /// Inserts a row, filling `id`, `created_at`, and `updated_at` when the
    /// caller left them out, and returns the row as stored.
    async fn insert(&self, collection: Collection, row: Value) -> StoreResult<Value>;

    /// Merges `patch` into the row with the given id and bumps `updated_at`.
    async fn update(&self, collection: Collection, id: &str, patch: Value) -> StoreResult<Value>;
}

pub(crate) fn store_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fills row defaults shared by store implementations. Returns the row id.
pub(crate) fn prepare_insert(row: &mut Value) -> StoreResult<String> {
    let object = row
        .as_object_mut()
        .ok_or_else(|| StoreError::Serialization("row must be a JSON object".to_string()))?;

    let id = match object.get("id").and_then(Value::as_str) {
        Some(existing) if !existing.is_empty() => existing.to_string(),
        _ => {
            let generated = Uuid::new_v4().to_string();
            object.insert("id".to_string(), json!(generated));
            generated
        }
    };

    let now = store_timestamp();
    object
        .entry("created_at".to_string())
        .or_insert_with(|| json!(now));
    object
        .entry("updated_at".to_string())
        .or_insert_with(|| json!(now));

    Ok(id)
}

pub(crate) fn merge_patch(row: &mut Value, patch: &Value) -> StoreResult<()> {
    let target = row
        .as_object_mut()
        .ok_or_else(|| StoreError::Serialization("stored row is not a JSON object".to_string()))?;
    let source = patch
        .as_object()
        .ok_or_else(|| StoreError::Serialization("patch must be a JSON object".to_string()))?;

    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
    target.insert("updated_at".to_string(), json!(store_timestamp()));
    Ok(())
}

/// Decodes store rows into typed models. Rows that fail to decode are
/// skipped and logged; a malformed row never aborts the batch.
pub fn decode_rows<T: serde::de::DeserializeOwned>(
    collection: Collection,
    rows: Vec<Value>,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!(
                    collection = collection.as_str(),
                    %err,
                    "skipping row that failed to decode"
                );
                None
            }
        })
        .collect()
}
