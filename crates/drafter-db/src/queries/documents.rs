//! Queries against the `documents` table.

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::PgPool;

use crate::models::Document;

/// Insert a payload into a collection and return the stored row, including
/// the server-assigned id and timestamps.
pub async fn insert_document(pool: &PgPool, collection: &str, payload: &Value) -> Result<Document> {
    let document = sqlx::query_as::<_, Document>(
        "INSERT INTO documents (collection, payload) \
         VALUES ($1, $2) \
         RETURNING *",
    )
    .bind(collection)
    .bind(payload)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert document into {collection:?}"))?;

    Ok(document)
}

/// Up to `limit` documents from a collection, most recent first.
pub async fn list_documents(pool: &PgPool, collection: &str, limit: i64) -> Result<Vec<Document>> {
    let documents = sqlx::query_as::<_, Document>(
        "SELECT * FROM documents \
         WHERE collection = $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(collection)
    .bind(limit)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list documents in {collection:?}"))?;

    Ok(documents)
}

/// Number of documents in a collection.
pub async fn count_documents(pool: &PgPool, collection: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = $1")
        .bind(collection)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to count documents in {collection:?}"))?;

    Ok(count)
}

/// Every distinct collection name in the store, sorted.
pub async fn list_collections(pool: &PgPool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT collection FROM documents ORDER BY collection")
            .fetch_all(pool)
            .await
            .context("failed to list collections")?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}
