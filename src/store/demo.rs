//! Demo-mode entity store.
//!
//! Serves deterministic synthetic entities keyed by slug pattern so the
//! whole delivery surface works without a backing store. Selected once at
//! process start; resolver code never branches on demo mode.
//!
//! Slug patterns: `private-*` is non-public, `expired-*` is past its expiry,
//! `locked-*` requires the password "paperhost", `restricted-*` is limited
//! to the allowlisted viewer email, anything else is a public document.
//! Short-link tokens: `gone` is deactivated, `spent` has exhausted
//! its view budget, `limited` carries a five-view budget, `locked` requires
//! the demo password.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{ContentStore, ViewTarget};
use crate::error::Result;
use crate::models::{
    AnalyticsEvent, Asset, Collection, CustomDomainBinding, Document, ShortLink,
    VerificationStatus, WebhookDeliveryLog, WebhookEndpoint,
};

/// Password accepted by all `locked-*` demo entities.
pub const DEMO_PASSWORD: &str = "paperhost";

/// Viewer email allowlisted on all `restricted-*` demo documents.
pub const DEMO_ALLOWED_EMAIL: &str = "viewer@demo.example";

/// Public path of the demo placeholder asset referenced by short links.
pub const DEMO_ASSET_PATH: &str = "demo/sample.svg";

// Fixed creation instants so landing listings order deterministically.
const WELCOME_CREATED: i64 = 1_748_822_400; // 2025-06-02
const STARTED_CREATED: i64 = 1_748_736_000; // 2025-06-01

/// Deterministic UUID for a demo entity.
fn demo_id(kind: &str, key: &str) -> Uuid {
    let name = format!("paperhost-demo/{kind}/{key}");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
}

fn fixed_time(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Synthetic store with in-process view counters.
pub struct DemoStore {
    workspace_id: Uuid,
    password_hash: String,
    views: Mutex<HashMap<Uuid, i64>>,
}

impl Default for DemoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoStore {
    pub fn new() -> Self {
        // Low cost: demo credentials guard nothing real.
        let password_hash = bcrypt::hash(DEMO_PASSWORD, 6)
            .unwrap_or_else(|_| String::new());
        Self {
            workspace_id: demo_id("workspace", "demo"),
            password_hash,
            views: Mutex::new(HashMap::new()),
        }
    }

    pub fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }

    fn recorded_views(&self, id: Uuid) -> i64 {
        self.views
            .lock()
            .map(|v| v.get(&id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record_view(&self, id: Uuid) {
        if let Ok(mut views) = self.views.lock() {
            *views.entry(id).or_insert(0) += 1;
        }
    }

    fn make_document(&self, slug: &str) -> Document {
        let id = demo_id("document", slug);
        let title = slug
            .split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        let created_at = match slug {
            "welcome" => fixed_time(WELCOME_CREATED),
            "getting-started" => fixed_time(STARTED_CREATED),
            _ => fixed_time(STARTED_CREATED),
        };

        Document {
            id,
            slug: slug.to_string(),
            title: title.clone(),
            content_html: format!(
                "<h1>{title}</h1><p>This is a demo document served from the synthetic \
                 store. Configure DATABASE_URL to serve real content.</p>"
            ),
            workspace_id: self.workspace_id,
            is_public: !slug.starts_with("private-"),
            expires_at: slug
                .starts_with("expired-")
                .then(|| fixed_time(1_577_836_800)), // 2020-01-01
            password_hash: slug
                .starts_with("locked-")
                .then(|| self.password_hash.clone()),
            allowed_emails: slug
                .starts_with("restricted-")
                .then(|| vec![DEMO_ALLOWED_EMAIL.to_string()]),
            view_count: self.recorded_views(id),
            created_at,
        }
    }

    fn make_asset(&self, path: &str) -> Asset {
        let id = demo_id("asset", path);
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        Asset {
            id,
            public_path: path.to_string(),
            file_name,
            mime_type: "image/svg+xml".to_string(),
            storage_key: format!("demo/{path}"),
            workspace_id: self.workspace_id,
            is_public: true,
            archived: false,
            expires_at: None,
            view_count: self.recorded_views(id),
            created_at: fixed_time(STARTED_CREATED),
        }
    }
}

#[async_trait]
impl ContentStore for DemoStore {
    async fn document_by_slug(&self, slug: &str) -> Result<Option<Document>> {
        Ok(Some(self.make_document(slug)))
    }

    async fn document_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        // Only the landing documents are reachable by id (domain bindings).
        for slug in ["welcome", "getting-started"] {
            if demo_id("document", slug) == id {
                return Ok(Some(self.make_document(slug)));
            }
        }
        Ok(None)
    }

    async fn document_for_workspace(
        &self,
        workspace_id: Uuid,
        slug: &str,
    ) -> Result<Option<Document>> {
        if workspace_id != self.workspace_id {
            return Ok(None);
        }
        Ok(Some(self.make_document(slug)))
    }

    async fn workspace_public_documents(
        &self,
        workspace_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Document>> {
        if workspace_id != self.workspace_id {
            return Ok(Vec::new());
        }
        let docs = ["welcome", "getting-started"]
            .iter()
            .map(|slug| self.make_document(slug))
            .take(limit.max(0) as usize)
            .collect();
        Ok(docs)
    }

    async fn asset_by_public_path(&self, path: &str) -> Result<Option<Asset>> {
        // Mirror the real store's query-level filter.
        if path.starts_with("private/") || path.starts_with("archived/") {
            return Ok(None);
        }
        Ok(Some(self.make_asset(path)))
    }

    async fn asset_by_id(&self, id: Uuid) -> Result<Option<Asset>> {
        if demo_id("asset", DEMO_ASSET_PATH) == id {
            return Ok(Some(self.make_asset(DEMO_ASSET_PATH)));
        }
        Ok(None)
    }

    async fn collection_by_id(&self, _id: Uuid) -> Result<Option<Collection>> {
        Ok(None)
    }

    async fn short_link_by_slug(&self, slug: &str) -> Result<Option<ShortLink>> {
        let id = demo_id("short_link", slug);
        let recorded = self.recorded_views(id);
        let link = match slug {
            "gone" => ShortLink {
                is_active: false,
                ..self.base_link(id, slug, recorded)
            },
            "spent" => ShortLink {
                max_views: Some(5),
                view_count: 5,
                ..self.base_link(id, slug, 0)
            },
            "limited" => ShortLink {
                max_views: Some(5),
                ..self.base_link(id, slug, recorded)
            },
            "locked" => ShortLink {
                password_hash: Some(self.password_hash.clone()),
                ..self.base_link(id, slug, recorded)
            },
            _ => self.base_link(id, slug, recorded),
        };
        Ok(Some(link))
    }

    async fn domain_binding(&self, hostname: &str) -> Result<Option<CustomDomainBinding>> {
        let hostname = hostname.to_lowercase();
        let binding = match hostname.as_str() {
            "demo.example" => Some(CustomDomainBinding {
                id: demo_id("domain", &hostname),
                hostname,
                document_id: None,
                workspace_id: Some(self.workspace_id),
                status: VerificationStatus::Verified,
                created_at: fixed_time(STARTED_CREATED),
            }),
            "docs.demo.example" => Some(CustomDomainBinding {
                id: demo_id("domain", &hostname),
                hostname,
                document_id: Some(demo_id("document", "welcome")),
                workspace_id: None,
                status: VerificationStatus::Verified,
                created_at: fixed_time(STARTED_CREATED),
            }),
            "pending.demo.example" => Some(CustomDomainBinding {
                id: demo_id("domain", &hostname),
                hostname,
                document_id: None,
                workspace_id: Some(self.workspace_id),
                status: VerificationStatus::Pending,
                created_at: fixed_time(STARTED_CREATED),
            }),
            _ => None,
        };
        Ok(binding)
    }

    async fn increment_view_count(&self, target: ViewTarget) -> Result<()> {
        let id = match target {
            ViewTarget::Document(id)
            | ViewTarget::Collection(id)
            | ViewTarget::Asset(id)
            | ViewTarget::ShortLink(id) => id,
        };
        self.record_view(id);
        Ok(())
    }

    async fn insert_analytics_event(&self, event: &AnalyticsEvent) -> Result<()> {
        tracing::debug!(
            event_type = %event.event_type,
            target_kind = %event.target_kind,
            "Demo store dropping analytics event"
        );
        Ok(())
    }

    async fn webhook_endpoints(&self, _document_id: Uuid) -> Result<Vec<WebhookEndpoint>> {
        // Demo mode never makes outbound calls.
        Ok(Vec::new())
    }

    async fn insert_webhook_log(&self, _entry: &WebhookDeliveryLog) -> Result<()> {
        Ok(())
    }

    async fn update_endpoint_status(
        &self,
        _endpoint_id: Uuid,
        _success: bool,
        _at: DateTime<Utc>,
    ) -> Result<()> {
        Ok(())
    }
}

impl DemoStore {
    fn base_link(&self, id: Uuid, slug: &str, view_count: i64) -> ShortLink {
        ShortLink {
            id,
            slug: slug.to_string(),
            asset_id: Some(demo_id("asset", DEMO_ASSET_PATH)),
            collection_id: None,
            password_hash: None,
            expires_at: None,
            max_views: None,
            view_count,
            is_active: true,
            created_at: fixed_time(STARTED_CREATED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slug_patterns_shape_policy() {
        let store = DemoStore::new();
        let public = store.document_by_slug("roadmap").await.unwrap().unwrap();
        assert!(public.is_public);

        let private = store
            .document_by_slug("private-notes")
            .await
            .unwrap()
            .unwrap();
        assert!(!private.is_public);

        let expired = store
            .document_by_slug("expired-offer")
            .await
            .unwrap()
            .unwrap();
        assert!(expired.expires_at.unwrap() < Utc::now());

        let locked = store
            .document_by_slug("locked-plan")
            .await
            .unwrap()
            .unwrap();
        assert!(locked.password_hash.is_some());

        let restricted = store
            .document_by_slug("restricted-brief")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            restricted.allowed_emails.as_deref(),
            Some([DEMO_ALLOWED_EMAIL.to_string()].as_slice())
        );
    }

    #[tokio::test]
    async fn resolution_is_deterministic() {
        let store = DemoStore::new();
        let a = store.document_by_slug("roadmap").await.unwrap().unwrap();
        let b = store.document_by_slug("roadmap").await.unwrap().unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.created_at, b.created_at);
    }

    #[tokio::test]
    async fn view_counts_accumulate_in_process() {
        let store = DemoStore::new();
        let doc = store.document_by_slug("roadmap").await.unwrap().unwrap();
        assert_eq!(doc.view_count, 0);

        store
            .increment_view_count(ViewTarget::Document(doc.id))
            .await
            .unwrap();
        let again = store.document_by_slug("roadmap").await.unwrap().unwrap();
        assert_eq!(again.view_count, 1);
    }

    #[tokio::test]
    async fn landing_documents_are_newest_first() {
        let store = DemoStore::new();
        let docs = store
            .workspace_public_documents(store.workspace_id(), 10)
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].created_at > docs[1].created_at);
    }

    #[tokio::test]
    async fn filtered_asset_paths_are_absent() {
        let store = DemoStore::new();
        assert!(store
            .asset_by_public_path("private/secret.png")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .asset_by_public_path("acme/logo.png")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn short_link_tokens() {
        let store = DemoStore::new();
        let gone = store.short_link_by_slug("gone").await.unwrap().unwrap();
        assert!(!gone.is_active);

        let spent = store.short_link_by_slug("spent").await.unwrap().unwrap();
        assert_eq!(spent.max_views, Some(5));
        assert_eq!(spent.view_count, 5);

        let open = store.short_link_by_slug("share-x").await.unwrap().unwrap();
        assert!(open.is_active);
        assert!(open.asset_id.is_some());
    }

    #[tokio::test]
    async fn only_verified_domains_exist_for_known_hosts() {
        let store = DemoStore::new();
        let ws = store.domain_binding("DEMO.example").await.unwrap().unwrap();
        assert!(ws.is_verified());
        assert!(ws.workspace_id.is_some());

        let pending = store
            .domain_binding("pending.demo.example")
            .await
            .unwrap()
            .unwrap();
        assert!(!pending.is_verified());

        assert!(store
            .domain_binding("unknown.example")
            .await
            .unwrap()
            .is_none());
    }
}
