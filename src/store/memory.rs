use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{
    merge_patch, prepare_insert, Collection, Query, RecordStore, SortOrder, StoreError, StoreResult,
};

/// In-memory record store. Backs unit and integration tests and is useful
/// for prototyping against the engine without a persistent backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads raw rows into a collection, bypassing insert defaults.
    pub async fn seed(&self, collection: Collection, rows: Vec<Value>) {
        let mut guard = self.rows.lock().await;
        guard.entry(collection).or_default().extend(rows);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, collection: Collection, query: Query) -> StoreResult<Vec<Value>> {
        let guard = self.rows.lock().await;
        let mut matched: Vec<Value> = guard
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row_matches(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, order)) = &query.order_by {
            matched.sort_by(|a, b| {
                let ordering = compare_fields(a, b, field);
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn insert(&self, collection: Collection, mut row: Value) -> StoreResult<Value> {
        prepare_insert(&mut row)?;
        let mut guard = self.rows.lock().await;
        guard.entry(collection).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> StoreResult<Value> {
        let mut guard = self.rows.lock().await;
        let rows = guard.entry(collection).or_default();
        let row = rows
            .iter_mut()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection.as_str(), id)))?;

        merge_patch(row, &patch)?;
        Ok(row.clone())
    }
}

fn row_matches(row: &Value, filters: &[(String, Value)]) -> bool {
    filters
        .iter()
        .all(|(field, expected)| row.get(field) == Some(expected))
}

fn compare_fields(a: &Value, b: &Value, field: &str) -> Ordering {
    compare_values(a.get(field), b.get(field))
}

// RFC 3339 timestamps sort correctly under plain string comparison, which
// is what the engine relies on for recorded_at/created_at ordering.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
