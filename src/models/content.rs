//! Content entities: documents, collections, and binary assets.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Published document entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub content_html: String,
    pub workspace_id: Uuid,
    pub is_public: bool,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Non-empty list restricts viewing to these addresses once the main
    /// verdict is Ok.
    pub allowed_emails: Option<Vec<String>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Named group of assets shared as a unit
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Collection {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub workspace_id: Uuid,
    pub is_public: bool,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Uploaded binary asset
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: Uuid,
    /// Opaque public URL path, e.g. "acme/logos/mark.png"
    pub public_path: String,
    pub file_name: String,
    pub mime_type: String,
    /// Key into the object storage backend
    pub storage_key: String,
    pub workspace_id: Uuid,
    pub is_public: bool,
    pub archived: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}
