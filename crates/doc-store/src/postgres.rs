use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Document, DocumentId, DocumentQuery, Result, SortOrder, StoreError,
    store::{DocumentStore, validate_document},
};

/// PostgreSQL-backed document store.
///
/// Documents live in a single `documents` table keyed by (collection, id)
/// with a JSONB body. Query filters use the `@>` containment operator.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            id: DocumentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            collection: row.try_get("collection")?,
            body: row.try_get("body")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn filter_value(query: &DocumentQuery) -> serde_json::Value {
        query
            .filter
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()))
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, document: Document) -> Result<()> {
        validate_document(&document)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&document.collection)
        .bind(document.id.as_uuid())
        .bind(&document.body)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict {
                    collection: document.collection.clone(),
                    reason: db_err
                        .constraint()
                        .map_or_else(|| db_err.message().to_string(), str::to_string),
                };
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT collection, id, body, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn replace(&self, document: Document) -> Result<Document> {
        validate_document(&document)?;

        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE documents
            SET body = $3, updated_at = $4
            WHERE collection = $1 AND id = $2
            RETURNING collection, id, body, created_at, updated_at
            "#,
        )
        .bind(&document.collection)
        .bind(document.id.as_uuid())
        .bind(&document.body)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict {
                    collection: document.collection.clone(),
                    reason: db_err
                        .constraint()
                        .map_or_else(|| db_err.message().to_string(), str::to_string),
                };
            }
            StoreError::Database(e)
        })?;

        match row {
            Some(row) => Self::row_to_document(row),
            None => Err(StoreError::NotFound {
                collection: document.collection,
                id: document.id,
            }),
        }
    }

    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let direction = match query.order {
            SortOrder::Oldest => "ASC",
            SortOrder::Newest => "DESC",
        };
        let sql = format!(
            "SELECT collection, id, body, created_at, updated_at FROM documents \
             WHERE collection = $1 AND body @> $2 \
             ORDER BY created_at {direction} LIMIT $3 OFFSET $4"
        );

        let rows = sqlx::query(&sql)
            .bind(&query.collection)
            .bind(Self::filter_value(&query))
            .bind(query.limit.map(|l| l as i64))
            .bind(query.offset.unwrap_or(0) as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn count(&self, query: DocumentQuery) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE collection = $1 AND body @> $2",
        )
        .bind(&query.collection)
        .bind(Self::filter_value(&query))
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn adjust_counter(
        &self,
        collection: &str,
        id: DocumentId,
        field: &str,
        delta: i64,
        max: i64,
    ) -> Result<Option<i64>> {
        // Check-and-write in one statement so concurrent adjustments cannot
        // push the counter out of range. Sums are taken as numeric so an
        // extreme delta is refused instead of overflowing bigint.
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE documents
            SET body = jsonb_set(body, ARRAY[$3::text], to_jsonb((body->>$3)::bigint + $4)),
                updated_at = now()
            WHERE collection = $1 AND id = $2
              AND CASE
                    WHEN jsonb_typeof(body->$3) = 'number'
                    THEN (body->>$3)::numeric + $4::numeric BETWEEN 0 AND $5::numeric
                    ELSE false
                  END
            RETURNING (body->>$3)::bigint
            "#,
        )
        .bind(collection)
        .bind(id.as_uuid())
        .bind(field)
        .bind(delta)
        .bind(max)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() {
            return Ok(updated);
        }

        // Nothing written: tell apart a missing document, a non-counter field
        // and a refused adjustment.
        let Some(document) = self.get(collection, id).await? else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            });
        };
        if document.int_field(field).is_none() {
            return Err(StoreError::NotACounter {
                collection: collection.to_string(),
                id,
                field: field.to_string(),
            });
        }

        tracing::debug!(%collection, %id, field, delta, "counter adjustment refused");
        Ok(None)
    }
}
