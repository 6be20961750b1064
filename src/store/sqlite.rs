use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, types::Value as SqlValue, Connection, OptionalExtension};
use serde_json::Value;

use super::{
    merge_patch, prepare_insert, Collection, Query, RecordStore, SortOrder, StoreError, StoreResult,
};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// SQLite-backed record store. Rows live as JSON documents in one
/// `(id, body)` table per collection; filters and ordering go through
/// `json_extract`. Intended for local or single-node deployments.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::Backend(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(backend_error)?;
        conn.execute_batch(SCHEMA_SQL).map_err(backend_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(backend_error)?;
        conn.execute_batch(SCHEMA_SQL).map_err(backend_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn select(&self, collection: Collection, query: Query) -> StoreResult<Vec<Value>> {
        let mut sql = format!("SELECT body FROM {}", collection.as_str());
        let mut binds: Vec<SqlValue> = Vec::new();

        for (index, (field, value)) in query.filters.iter().enumerate() {
            let keyword = if index == 0 { " WHERE" } else { " AND" };
            sql.push_str(&format!(
                "{} json_extract(body, '$.{}') = ?{}",
                keyword,
                checked_field(field)?,
                index + 1
            ));
            binds.push(bind_value(value)?);
        }

        if let Some((field, order)) = &query.order_by {
            let direction = match order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            sql.push_str(&format!(
                " ORDER BY json_extract(body, '$.{}') {}",
                checked_field(field)?,
                direction
            ));
        }

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let conn = self.lock()?;
        let mut statement = conn.prepare(&sql).map_err(backend_error)?;
        let rows = statement
            .query_map(rusqlite::params_from_iter(binds), |row| {
                row.get::<_, String>(0)
            })
            .map_err(backend_error)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(backend_error)?;

        rows.iter()
            .map(|body| {
                serde_json::from_str(body).map_err(|err| StoreError::Serialization(err.to_string()))
            })
            .collect()
    }

    async fn insert(&self, collection: Collection, mut row: Value) -> StoreResult<Value> {
        let id = prepare_insert(&mut row)?;
        let body =
            serde_json::to_string(&row).map_err(|err| StoreError::Serialization(err.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (id, body) VALUES (?1, ?2)",
                collection.as_str()
            ),
            params![id, body],
        )
        .map_err(backend_error)?;

        Ok(row)
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> StoreResult<Value> {
        let conn = self.lock()?;
        let existing: Option<String> = conn
            .query_row(
                &format!("SELECT body FROM {} WHERE id = ?1", collection.as_str()),
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend_error)?;

        let body = existing
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection.as_str(), id)))?;
        let mut row: Value =
            serde_json::from_str(&body).map_err(|err| StoreError::Serialization(err.to_string()))?;
        merge_patch(&mut row, &patch)?;

        let updated =
            serde_json::to_string(&row).map_err(|err| StoreError::Serialization(err.to_string()))?;
        conn.execute(
            &format!("UPDATE {} SET body = ?1 WHERE id = ?2", collection.as_str()),
            params![updated, id],
        )
        .map_err(backend_error)?;

        Ok(row)
    }
}

fn backend_error(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Field names are crate-internal, but reject anything that could escape
/// the json_extract path expression.
fn checked_field(field: &str) -> StoreResult<&str> {
    if !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(field)
    } else {
        Err(StoreError::Serialization(format!(
            "invalid field name: {field:?}"
        )))
    }
}

fn bind_value(value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(SqlValue::Integer(integer))
            } else if let Some(real) = number.as_f64() {
                Ok(SqlValue::Real(real))
            } else {
                Err(StoreError::Serialization(format!(
                    "unsupported numeric filter value: {number}"
                )))
            }
        }
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        other => Err(StoreError::Serialization(format!(
            "unsupported filter value: {other}"
        ))),
    }
}
