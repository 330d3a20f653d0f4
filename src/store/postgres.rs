//! Postgres-backed entity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ContentStore, ViewTarget};
use crate::error::Result;
use crate::models::{
    AnalyticsEvent, Asset, Collection, CustomDomainBinding, Document, ShortLink,
    WebhookDeliveryLog, WebhookEndpoint,
};

const DOCUMENT_COLUMNS: &str = "id, slug, title, content_html, workspace_id, is_public, \
     expires_at, password_hash, allowed_emails, view_count, created_at";

const ASSET_COLUMNS: &str = "id, public_path, file_name, mime_type, storage_key, workspace_id, \
     is_public, archived, expires_at, view_count, created_at";

/// Entity store over a Postgres pool.
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn document_by_slug(&self, slug: &str) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.db)
        .await?;
        Ok(doc)
    }

    async fn document_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(doc)
    }

    async fn document_for_workspace(
        &self,
        workspace_id: Uuid,
        slug: &str,
    ) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE workspace_id = $1 AND slug = $2"
        ))
        .bind(workspace_id)
        .bind(slug)
        .fetch_optional(&self.db)
        .await?;
        Ok(doc)
    }

    async fn workspace_public_documents(
        &self,
        workspace_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE workspace_id = $1 AND is_public = true \
             ORDER BY created_at DESC \
             LIMIT $2"
        ))
        .bind(workspace_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(docs)
    }

    async fn asset_by_public_path(&self, path: &str) -> Result<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets \
             WHERE public_path = $1 AND is_public = true AND archived = false"
        ))
        .bind(path)
        .fetch_optional(&self.db)
        .await?;
        Ok(asset)
    }

    async fn asset_by_id(&self, id: Uuid) -> Result<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(asset)
    }

    async fn collection_by_id(&self, id: Uuid) -> Result<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>(
            "SELECT id, slug, name, workspace_id, is_public, expires_at, password_hash, \
                    view_count, created_at \
             FROM collections WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(collection)
    }

    async fn short_link_by_slug(&self, slug: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            "SELECT id, slug, asset_id, collection_id, password_hash, expires_at, \
                    max_views, view_count, is_active, created_at \
             FROM short_links WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.db)
        .await?;
        Ok(link)
    }

    async fn domain_binding(&self, hostname: &str) -> Result<Option<CustomDomainBinding>> {
        let binding = sqlx::query_as::<_, CustomDomainBinding>(
            "SELECT id, hostname, document_id, workspace_id, status, created_at \
             FROM custom_domains WHERE hostname = $1",
        )
        .bind(hostname.to_lowercase())
        .fetch_optional(&self.db)
        .await?;
        Ok(binding)
    }

    async fn increment_view_count(&self, target: ViewTarget) -> Result<()> {
        let (sql, id) = match target {
            ViewTarget::Document(id) => {
                ("UPDATE documents SET view_count = view_count + 1 WHERE id = $1", id)
            }
            ViewTarget::Collection(id) => {
                ("UPDATE collections SET view_count = view_count + 1 WHERE id = $1", id)
            }
            ViewTarget::Asset(id) => {
                ("UPDATE assets SET view_count = view_count + 1 WHERE id = $1", id)
            }
            ViewTarget::ShortLink(id) => {
                ("UPDATE short_links SET view_count = view_count + 1 WHERE id = $1", id)
            }
        };
        sqlx::query(sql).bind(id).execute(&self.db).await?;
        Ok(())
    }

    async fn insert_analytics_event(&self, event: &AnalyticsEvent) -> Result<()> {
        sqlx::query(
            "INSERT INTO analytics_events (event_type, target_kind, target_id, hostname, occurred_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&event.event_type)
        .bind(&event.target_kind)
        .bind(event.target_id)
        .bind(&event.hostname)
        .bind(event.occurred_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn webhook_endpoints(&self, document_id: Uuid) -> Result<Vec<WebhookEndpoint>> {
        let endpoints = sqlx::query_as::<_, WebhookEndpoint>(
            "SELECT id, document_id, url, secret, enabled, events, failure_count, \
                    last_triggered_at, created_at \
             FROM webhook_endpoints WHERE document_id = $1 \
             ORDER BY created_at",
        )
        .bind(document_id)
        .fetch_all(&self.db)
        .await?;
        Ok(endpoints)
    }

    async fn insert_webhook_log(&self, entry: &WebhookDeliveryLog) -> Result<()> {
        sqlx::query(
            "INSERT INTO webhook_delivery_logs (endpoint_id, event_type, success, status_code, timestamp) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.endpoint_id)
        .bind(&entry.event_type)
        .bind(entry.success)
        .bind(entry.status_code)
        .bind(entry.timestamp)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_endpoint_status(
        &self,
        endpoint_id: Uuid,
        success: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if success {
            sqlx::query(
                "UPDATE webhook_endpoints \
                 SET failure_count = 0, last_triggered_at = $2 \
                 WHERE id = $1",
            )
            .bind(endpoint_id)
            .bind(at)
            .execute(&self.db)
            .await?;
        } else {
            sqlx::query(
                "UPDATE webhook_endpoints \
                 SET failure_count = failure_count + 1 \
                 WHERE id = $1",
            )
            .bind(endpoint_id)
            .execute(&self.db)
            .await?;
        }
        Ok(())
    }
}
