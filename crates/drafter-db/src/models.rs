//! Row types for the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A stored document: an opaque JSON payload filed under a collection name.
///
/// `id`, `created_at`, and `updated_at` are assigned by the database on
/// insert. The payload is stored verbatim; the store never reaches into it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub collection: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
