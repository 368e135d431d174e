//! `SQLite` implementation of [`DocumentStore`].
//!
//! Every document lives in the single `documents` table as JSON text. Field
//! predicates read the body with `json_extract`, so stored timestamps compare
//! as text and stored integers compare as integers.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use homemonitor_app::ports::store::{DocumentStore, Filter, Query};
use homemonitor_domain::document::{ID_FIELD, is_valid_field_name};
use homemonitor_domain::error::HomeMonitorError;
use serde_json::Value;

use crate::error::StorageError;

/// Wrapper for converting database rows into JSON bodies.
struct Wrapper(Value);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let body: String = row.try_get("body")?;
        let value = serde_json::from_str(&body).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(value))
    }
}

const SELECT_BY_ID: &str = "SELECT body FROM documents WHERE collection = ? AND id = ?";

const UPSERT: &str = r"
    INSERT INTO documents (collection, id, body)
    VALUES (?, ?, ?)
    ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body
";

const INSERT_UNKEYED: &str = r"
    INSERT INTO documents (collection, id, body)
    VALUES (?, NULL, ?)
    RETURNING seq
";

// The sequence number unless a numeric key at or above it is already taken
// in the collection.
const NEXT_KEY: &str = r"
    SELECT MAX(?, COALESCE((
        SELECT MAX(CAST(id AS INTEGER)) FROM documents
        WHERE collection = ? AND id NOT GLOB '*[^0-9]*'
    ), 0) + 1)
";

const ASSIGN_KEY: &str = r"
    UPDATE documents
    SET id = CAST(? AS TEXT), body = json_set(body, ?, ?)
    WHERE seq = ?
";

fn identifier(name: &str) -> Result<&str, StorageError> {
    if is_valid_field_name(name) {
        Ok(name)
    } else {
        Err(StorageError::InvalidIdentifier(name.to_owned()))
    }
}

fn push_field(qb: &mut QueryBuilder<'_, Sqlite>, field: &str) -> Result<(), StorageError> {
    let field = identifier(field)?;
    qb.push(format_args!("json_extract(body, '$.{field}')"));
    Ok(())
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => qb.push("NULL"),
        Value::Bool(flag) => qb.push_bind(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(int) => qb.push_bind(int),
            None => qb.push_bind(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => qb.push_bind(text.clone()),
        other => qb.push_bind(other.to_string()),
    };
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) -> Result<(), StorageError> {
    qb.push(" AND ");
    match filter {
        Filter::In { values, .. } if values.is_empty() => {
            qb.push("0");
        }
        Filter::In { field, values } => {
            push_field(qb, field)?;
            qb.push(" IN (");
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    qb.push(", ");
                }
                push_value(qb, value);
            }
            qb.push(")");
        }
        Filter::Eq { field, value } | Filter::Gte { field, value } | Filter::Lte { field, value } => {
            push_field(qb, field)?;
            qb.push(match filter {
                Filter::Gte { .. } => " >= ",
                Filter::Lte { .. } => " <= ",
                _ => " = ",
            });
            push_value(qb, value);
        }
    }
    Ok(())
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// `SQLite`-backed document store.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn put_all(
        &self,
        collection: &str,
        documents: Vec<(Option<String>, Value)>,
    ) -> Result<Vec<String>, StorageError> {
        let id_path = format!("$.{ID_FIELD}");
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(documents.len());
        for (id, body) in documents {
            let body = serde_json::to_string(&body)?;
            if let Some(id) = id {
                sqlx::query(UPSERT)
                    .bind(collection)
                    .bind(&id)
                    .bind(body)
                    .execute(&mut *tx)
                    .await?;
                ids.push(id);
            } else {
                let seq: i64 = sqlx::query_scalar(INSERT_UNKEYED)
                    .bind(collection)
                    .bind(body)
                    .fetch_one(&mut *tx)
                    .await?;
                let key: i64 = sqlx::query_scalar(NEXT_KEY)
                    .bind(seq)
                    .bind(collection)
                    .fetch_one(&mut *tx)
                    .await?;
                sqlx::query(ASSIGN_KEY)
                    .bind(key)
                    .bind(&id_path)
                    .bind(key)
                    .bind(seq)
                    .execute(&mut *tx)
                    .await?;
                ids.push(key.to_string());
            }
        }
        tx.commit().await?;
        Ok(ids)
    }
}

impl DocumentStore for SqliteDocumentStore {
    async fn get(
        &self,
        collection: &'static str,
        id: String,
    ) -> Result<Option<Value>, HomeMonitorError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn find(
        &self,
        collection: &'static str,
        query: Query,
    ) -> Result<Vec<Value>, HomeMonitorError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT body FROM documents WHERE collection = ");
        qb.push_bind(collection);
        for filter in &query.filters {
            push_filter(&mut qb, filter)?;
        }
        qb.push(" ORDER BY ");
        if let Some(order) = &query.order {
            push_field(&mut qb, &order.field)?;
            qb.push(if order.descending { " DESC, " } else { " ASC, " });
        }
        qb.push("seq ASC");
        match (query.page.limit, query.page.skip) {
            (Some(limit), skip) => {
                qb.push(" LIMIT ").push_bind(to_i64(limit));
                if let Some(skip) = skip {
                    qb.push(" OFFSET ").push_bind(to_i64(skip));
                }
            }
            (None, Some(skip)) => {
                qb.push(" LIMIT -1 OFFSET ").push_bind(to_i64(skip));
            }
            (None, None) => {}
        }

        let rows: Vec<Wrapper> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn put(
        &self,
        collection: &'static str,
        documents: Vec<(Option<String>, Value)>,
    ) -> Result<Vec<String>, HomeMonitorError> {
        Ok(self.put_all(collection, documents).await?)
    }

    async fn delete(
        &self,
        collection: &'static str,
        ids: Vec<String>,
    ) -> Result<u64, HomeMonitorError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM documents WHERE collection = ");
        qb.push_bind(collection).push(" AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected())
    }

    async fn ensure_index(
        &self,
        collection: &'static str,
        field: String,
    ) -> Result<(), HomeMonitorError> {
        let collection = identifier(collection)?;
        let field = identifier(&field)?;
        let statement = format!(
            "CREATE INDEX IF NOT EXISTS idx_{collection}_{field} \
             ON documents (collection, json_extract(body, '$.{field}'))"
        );
        sqlx::query(&statement)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        tracing::debug!(collection, field, "index ensured");
        Ok(())
    }
}
