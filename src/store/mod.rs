//! Entity store adapters.
//!
//! `ContentStore` is the only seam between the delivery engine and the
//! backing relational store. Two implementations exist: `PgStore` over
//! Postgres, and `DemoStore`, a deterministic synthetic generator selected
//! once at process start when no database is configured. Callers never
//! branch on which one they hold.

pub mod demo;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AnalyticsEvent, Asset, Collection, CustomDomainBinding, Document, ShortLink,
    WebhookDeliveryLog, WebhookEndpoint,
};

pub use demo::DemoStore;
pub use postgres::PgStore;

/// Which counter an increment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTarget {
    Document(Uuid),
    Collection(Uuid),
    Asset(Uuid),
    ShortLink(Uuid),
}

/// Narrow read/write contract over the backing store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn document_by_slug(&self, slug: &str) -> Result<Option<Document>>;

    async fn document_by_id(&self, id: Uuid) -> Result<Option<Document>>;

    /// Slug lookup scoped to one workspace (workspace-bound custom domains).
    async fn document_for_workspace(
        &self,
        workspace_id: Uuid,
        slug: &str,
    ) -> Result<Option<Document>>;

    /// Public documents of a workspace, newest first, capped at `limit`.
    async fn workspace_public_documents(
        &self,
        workspace_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Document>>;

    /// Opaque public-path lookup, filtered to public, non-archived assets.
    async fn asset_by_public_path(&self, path: &str) -> Result<Option<Asset>>;

    async fn asset_by_id(&self, id: Uuid) -> Result<Option<Asset>>;

    async fn collection_by_id(&self, id: Uuid) -> Result<Option<Collection>>;

    async fn short_link_by_slug(&self, slug: &str) -> Result<Option<ShortLink>>;

    /// Lower-cased hostname lookup. Returns bindings in any verification
    /// state; callers gate on `is_verified`.
    async fn domain_binding(&self, hostname: &str) -> Result<Option<CustomDomainBinding>>;

    /// Atomic view-count increment. Never read-modify-write.
    async fn increment_view_count(&self, target: ViewTarget) -> Result<()>;

    async fn insert_analytics_event(&self, event: &AnalyticsEvent) -> Result<()>;

    async fn webhook_endpoints(&self, document_id: Uuid) -> Result<Vec<WebhookEndpoint>>;

    async fn insert_webhook_log(&self, entry: &WebhookDeliveryLog) -> Result<()>;

    /// Per-attempt endpoint accounting: on success reset `failure_count` to
    /// zero and set `last_triggered_at`; on failure increment the counter.
    /// Never auto-disables an endpoint.
    async fn update_endpoint_status(
        &self,
        endpoint_id: Uuid,
        success: bool,
        at: DateTime<Utc>,
    ) -> Result<()>;
}
