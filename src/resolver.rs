//! Content resolution.
//!
//! Disambiguates the three addressing schemes (custom domain, document slug,
//! short-link token) against one inbound request, fetches the target entity,
//! and asks the access-control evaluator for a verdict. On `Ok` it schedules
//! view-count and analytics side effects before returning; it never awaits
//! them.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::access::{self, PolicyAttrs, RequestCredentials, Verdict};
use crate::emitter::SideEffectEmitter;
use crate::error::Result;
use crate::models::{Asset, Collection, Document, DomainTarget, ShortLink, ShortLinkTarget};
use crate::models::AnalyticsEvent;
use crate::store::{ContentStore, ViewTarget};

/// First path segments that can never be content slugs. Prevents slug
/// collision with system routes.
pub const RESERVED_SLUGS: &[&str] = &[
    "api",
    "dashboard",
    "p",
    "assets",
    "static",
    "health",
    "login",
    "signup",
    "admin",
    "settings",
    "docs",
    "favicon.ico",
    "robots.txt",
];

/// Maximum documents on a synthesized workspace landing page.
pub const LANDING_LIMIT: i64 = 10;

pub fn is_reserved_slug(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug)
}

/// What a successful resolution points at.
#[derive(Debug, Clone)]
pub enum ResolvedTarget {
    Document(Document),
    /// Synthesized listing of a workspace's public documents.
    Landing {
        workspace_id: Uuid,
        documents: Vec<Document>,
    },
    Asset(Asset),
    LinkedAsset {
        link: ShortLink,
        asset: Asset,
    },
    LinkedCollection {
        link: ShortLink,
        collection: Collection,
    },
}

/// How the resolved content should be rendered. Domain-routed HTML is
/// edge-cacheable; slug-routed HTML is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderHint {
    #[default]
    Standard,
    DomainRouted,
}

/// Outcome of a resolution attempt. `target` is present only when the
/// verdict is `Ok`.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub verdict: Verdict,
    pub target: Option<ResolvedTarget>,
    pub render_hint: RenderHint,
}

impl Resolution {
    fn denied(verdict: Verdict) -> Self {
        Self {
            verdict,
            target: None,
            render_hint: RenderHint::default(),
        }
    }

    fn ok(target: ResolvedTarget) -> Self {
        Self {
            verdict: Verdict::Ok,
            target: Some(target),
            render_hint: RenderHint::default(),
        }
    }
}

/// The resolution engine.
pub struct Resolver {
    store: Arc<dyn ContentStore>,
    emitter: SideEffectEmitter,
}

impl Resolver {
    pub fn new(store: Arc<dyn ContentStore>, emitter: SideEffectEmitter) -> Self {
        Self { store, emitter }
    }

    /// Resolve a page request. Addressing precedence, first match wins:
    /// verified custom domain, reserved word, global document slug.
    pub async fn resolve_page(
        &self,
        host: Option<&str>,
        segments: &[&str],
        creds: &RequestCredentials,
    ) -> Result<Resolution> {
        if let Some(host) = host {
            if let Some(binding) = self.store.domain_binding(host).await? {
                if binding.is_verified() {
                    return self.resolve_via_binding(&binding.target(), host, segments, creds).await;
                }
            }
        }

        let Some(slug) = segments.first().copied().filter(|s| !s.is_empty()) else {
            return Ok(Resolution::denied(Verdict::NotFound));
        };
        if is_reserved_slug(slug) {
            return Ok(Resolution::denied(Verdict::NotFound));
        }

        let Some(doc) = self.store.document_by_slug(slug).await? else {
            return Ok(Resolution::denied(Verdict::NotFound));
        };
        self.finish_document(doc, host, creds)
    }

    /// Resolve a request that arrived on a verified custom domain.
    pub async fn resolve_domain(
        &self,
        host: &str,
        segments: &[&str],
        creds: &RequestCredentials,
    ) -> Result<Resolution> {
        let Some(binding) = self.store.domain_binding(host).await? else {
            return Ok(Resolution::denied(Verdict::NotFound));
        };
        if !binding.is_verified() {
            return Ok(Resolution::denied(Verdict::NotFound));
        }
        self.resolve_via_binding(&binding.target(), host, segments, creds).await
    }

    async fn resolve_via_binding(
        &self,
        target: &Option<DomainTarget>,
        host: &str,
        segments: &[&str],
        creds: &RequestCredentials,
    ) -> Result<Resolution> {
        let mut resolution = match target {
            Some(DomainTarget::Document(id)) => {
                match self.store.document_by_id(*id).await? {
                    Some(doc) => self.finish_document(doc, Some(host), creds)?,
                    None => Resolution::denied(Verdict::NotFound),
                }
            }
            Some(DomainTarget::Workspace(workspace_id)) => {
                let scoped = match segments.first().copied().filter(|s| !s.is_empty()) {
                    Some(slug) => {
                        self.store
                            .document_for_workspace(*workspace_id, slug)
                            .await?
                    }
                    None => None,
                };
                match scoped {
                    Some(doc) => self.finish_document(doc, Some(host), creds)?,
                    None => {
                        // Fall back to the synthesized landing listing.
                        let documents = self
                            .store
                            .workspace_public_documents(*workspace_id, LANDING_LIMIT)
                            .await?;
                        Resolution::ok(ResolvedTarget::Landing {
                            workspace_id: *workspace_id,
                            documents,
                        })
                    }
                }
            }
            // Malformed binding rows resolve nothing.
            None => Resolution::denied(Verdict::NotFound),
        };
        resolution.render_hint = RenderHint::DomainRouted;
        Ok(resolution)
    }

    /// Resolve an asset request: the full path is an opaque public-path
    /// lookup against public, non-archived assets.
    pub async fn resolve_asset(
        &self,
        path: &str,
        host: Option<&str>,
        creds: &RequestCredentials,
    ) -> Result<Resolution> {
        let path = path.trim_start_matches('/');
        let Some(asset) = self.store.asset_by_public_path(path).await? else {
            return Ok(Resolution::denied(Verdict::NotFound));
        };

        let verdict = access::evaluate(&PolicyAttrs::from(&asset), Utc::now(), creds);
        if verdict != Verdict::Ok {
            return Ok(Resolution::denied(verdict));
        }

        self.emitter.record_view(ViewTarget::Asset(asset.id));
        self.emitter.record_event(AnalyticsEvent::now(
            "asset.viewed",
            "asset",
            asset.id,
            host.map(String::from),
        ));
        Ok(Resolution::ok(ResolvedTarget::Asset(asset)))
    }

    /// Resolve a short-link token. The link's own policy attributes gate
    /// access; the referenced target must exist and not be archived.
    pub async fn resolve_short_link(
        &self,
        token: &str,
        host: Option<&str>,
        creds: &RequestCredentials,
    ) -> Result<Resolution> {
        let Some(link) = self.store.short_link_by_slug(token).await? else {
            return Ok(Resolution::denied(Verdict::NotFound));
        };

        let verdict = access::evaluate(&PolicyAttrs::from(&link), Utc::now(), creds);
        if verdict != Verdict::Ok {
            return Ok(Resolution::denied(verdict));
        }

        let target = match link.target() {
            Some(ShortLinkTarget::Asset(id)) => match self.store.asset_by_id(id).await? {
                Some(asset) if !asset.archived => ResolvedTarget::LinkedAsset { link, asset },
                _ => return Ok(Resolution::denied(Verdict::NotFound)),
            },
            Some(ShortLinkTarget::Collection(id)) => match self.store.collection_by_id(id).await? {
                Some(collection) => ResolvedTarget::LinkedCollection { link, collection },
                None => return Ok(Resolution::denied(Verdict::NotFound)),
            },
            None => return Ok(Resolution::denied(Verdict::NotFound)),
        };

        if let ResolvedTarget::LinkedAsset { link, .. }
        | ResolvedTarget::LinkedCollection { link, .. } = &target
        {
            self.emitter.record_view(ViewTarget::ShortLink(link.id));
            self.emitter.record_event(AnalyticsEvent::now(
                "short_link.viewed",
                "short_link",
                link.id,
                host.map(String::from),
            ));
        }
        Ok(Resolution::ok(target))
    }

    fn finish_document(
        &self,
        doc: Document,
        host: Option<&str>,
        creds: &RequestCredentials,
    ) -> Result<Resolution> {
        let verdict = access::evaluate(&PolicyAttrs::from(&doc), Utc::now(), creds);
        if verdict != Verdict::Ok {
            return Ok(Resolution::denied(verdict));
        }
        // The allowlist layers on top of the main verdict; an unlisted
        // viewer is indistinguishable from one hitting a private document.
        if let Some(allowed) = &doc.allowed_emails {
            if !access::email_allowed(allowed, creds) {
                return Ok(Resolution::denied(Verdict::Private));
            }
        }

        self.emitter.record_view(ViewTarget::Document(doc.id));
        self.emitter.record_event(AnalyticsEvent::now(
            "document.viewed",
            "document",
            doc.id,
            host.map(String::from),
        ));
        self.emitter.trigger_webhooks(
            doc.id,
            "document.viewed",
            json!({ "slug": doc.slug, "title": doc.title }),
        );
        Ok(Resolution::ok(ResolvedTarget::Document(doc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::store::DemoStore;
    use crate::webhooks::WebhookDeliverer;

    fn resolver_over(store: Arc<DemoStore>) -> Resolver {
        let deliverer = Arc::new(
            WebhookDeliverer::new(store.clone(), Duration::from_secs(1)).unwrap(),
        );
        let emitter = SideEffectEmitter::new(store.clone(), deliverer);
        Resolver::new(store, emitter)
    }

    fn no_creds() -> RequestCredentials {
        RequestCredentials::default()
    }

    #[tokio::test]
    async fn reserved_slugs_are_not_found() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        for slug in ["api", "dashboard", "p"] {
            let res = resolver
                .resolve_page(None, &[slug], &no_creds())
                .await
                .unwrap();
            assert_eq!(res.verdict, Verdict::NotFound, "slug {slug}");
        }
    }

    #[tokio::test]
    async fn public_slug_resolves_ok() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        let res = resolver
            .resolve_page(None, &["roadmap"], &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Ok);
        match res.target {
            Some(ResolvedTarget::Document(doc)) => assert_eq!(doc.slug, "roadmap"),
            other => panic!("Expected document target, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolution_is_idempotent_modulo_view_count() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        let first = resolver
            .resolve_page(None, &["roadmap"], &no_creds())
            .await
            .unwrap();
        let second = resolver
            .resolve_page(None, &["roadmap"], &no_creds())
            .await
            .unwrap();
        assert_eq!(first.verdict, second.verdict);
        let id = |r: &Resolution| match &r.target {
            Some(ResolvedTarget::Document(d)) => d.id,
            _ => panic!("expected document"),
        };
        assert_eq!(id(&first), id(&second));
    }

    #[tokio::test]
    async fn email_allowlist_layers_after_the_main_verdict() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));

        // No email supplied: indistinguishable from a private document.
        let res = resolver
            .resolve_page(None, &["restricted-brief"], &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Private);
        assert!(res.target.is_none());

        // Unlisted email: same denial.
        let creds = RequestCredentials {
            password: None,
            email: Some("stranger@elsewhere.example".into()),
        };
        let res = resolver
            .resolve_page(None, &["restricted-brief"], &creds)
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Private);

        // Allowlisted email, case-insensitive: serves the document.
        let creds = RequestCredentials {
            password: None,
            email: Some("Viewer@Demo.Example".into()),
        };
        let res = resolver
            .resolve_page(None, &["restricted-brief"], &creds)
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Ok);
        assert!(matches!(res.target, Some(ResolvedTarget::Document(_))));
    }

    #[tokio::test]
    async fn allowlist_denials_never_count_views() {
        let store = Arc::new(DemoStore::new());
        let resolver = resolver_over(store.clone());

        let res = resolver
            .resolve_page(None, &["restricted-brief"], &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Private);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let doc = store
            .document_by_slug("restricted-brief")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.view_count, 0);

        let creds = RequestCredentials {
            password: None,
            email: Some("viewer@demo.example".into()),
        };
        let res = resolver
            .resolve_page(None, &["restricted-brief"], &creds)
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Ok);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let doc = store
            .document_by_slug("restricted-brief")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.view_count, 1);
    }

    #[tokio::test]
    async fn denial_verdicts_carry_no_target() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        let res = resolver
            .resolve_page(None, &["private-notes"], &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Private);
        assert!(res.target.is_none());
    }

    #[tokio::test]
    async fn domain_routed_resolutions_carry_the_render_hint() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));

        let via_domain = resolver
            .resolve_page(Some("demo.example"), &["welcome"], &no_creds())
            .await
            .unwrap();
        assert_eq!(via_domain.render_hint, RenderHint::DomainRouted);

        let via_slug = resolver
            .resolve_page(None, &["roadmap"], &no_creds())
            .await
            .unwrap();
        assert_eq!(via_slug.render_hint, RenderHint::Standard);
    }

    #[tokio::test]
    async fn workspace_domain_root_serves_landing_newest_first() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        let res = resolver
            .resolve_page(Some("demo.example"), &[], &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Ok);
        match res.target {
            Some(ResolvedTarget::Landing { documents, .. }) => {
                assert_eq!(documents.len(), 2);
                assert!(documents[0].created_at > documents[1].created_at);
            }
            other => panic!("Expected landing target, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn workspace_domain_slug_serves_the_document_not_the_landing() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        let res = resolver
            .resolve_page(Some("demo.example"), &["welcome"], &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Ok);
        match res.target {
            Some(ResolvedTarget::Document(doc)) => assert_eq!(doc.slug, "welcome"),
            other => panic!("Expected document target, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn document_bound_domain_serves_that_document_directly() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        let res = resolver
            .resolve_page(Some("docs.demo.example"), &["anything"], &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Ok);
        match res.target {
            Some(ResolvedTarget::Document(doc)) => assert_eq!(doc.slug, "welcome"),
            other => panic!("Expected document target, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pending_domain_falls_through_to_slug_addressing() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        let res = resolver
            .resolve_page(Some("pending.demo.example"), &["roadmap"], &no_creds())
            .await
            .unwrap();
        // The binding exists but is unverified, so the global slug wins.
        assert_eq!(res.verdict, Verdict::Ok);
        match res.target {
            Some(ResolvedTarget::Document(doc)) => assert_eq!(doc.slug, "roadmap"),
            other => panic!("Expected document target, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn asset_path_resolves_and_filters() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));
        let res = resolver
            .resolve_asset("acme/logo.png", None, &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Ok);

        let res = resolver
            .resolve_asset("private/secret.png", None, &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::NotFound);
    }

    #[tokio::test]
    async fn short_link_tokens_gate_access() {
        let resolver = resolver_over(Arc::new(DemoStore::new()));

        let res = resolver
            .resolve_short_link("spent", None, &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::ViewLimitExceeded);

        let res = resolver
            .resolve_short_link("gone", None, &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::ViewLimitExceeded);

        let res = resolver
            .resolve_short_link("locked", None, &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::PasswordRequired);

        let res = resolver
            .resolve_short_link("share-1", None, &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::Ok);
        assert!(matches!(
            res.target,
            Some(ResolvedTarget::LinkedAsset { .. })
        ));
    }

    #[tokio::test]
    async fn short_link_views_accumulate_toward_the_budget() {
        let store = Arc::new(DemoStore::new());
        let resolver = resolver_over(store.clone());

        for _ in 0..5 {
            let res = resolver
                .resolve_short_link("limited", None, &no_creds())
                .await
                .unwrap();
            assert_eq!(res.verdict, Verdict::Ok);
            // Let the detached increment land before the next attempt.
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let res = resolver
            .resolve_short_link("limited", None, &no_creds())
            .await
            .unwrap();
        assert_eq!(res.verdict, Verdict::ViewLimitExceeded);
    }
}
