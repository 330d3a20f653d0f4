//! Public document pages.
//!
//! `GET /` serves the workspace landing when the request arrives on a
//! workspace-bound custom domain; `GET /{slug}` resolves a document by
//! custom domain or global slug.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use super::{credentials, request_host, CredentialQuery};
use crate::api::{render, SharedState};
use crate::error::Result;
use crate::resolver::{RenderHint, ResolvedTarget};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(root_page))
        .route("/{slug}", get(document_page))
}

async fn root_page(
    State(state): State<SharedState>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let creds = credentials(&query, &headers);
    let host = request_host(&headers);
    let resolution = state
        .resolver
        .resolve_page(host.as_deref(), &[], &creds)
        .await?;
    Ok(render_page(resolution))
}

async fn document_page(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let creds = credentials(&query, &headers);
    let host = request_host(&headers);
    let resolution = state
        .resolver
        .resolve_page(host.as_deref(), &[slug.as_str()], &creds)
        .await?;
    Ok(render_page(resolution))
}

pub(super) fn render_page(resolution: crate::resolver::Resolution) -> Response {
    let domain_routed = resolution.render_hint == RenderHint::DomainRouted;
    let mut response = match resolution.target {
        Some(ResolvedTarget::Document(doc)) => render::document_page(&doc).into_response(),
        Some(ResolvedTarget::Landing { documents, .. }) => {
            render::landing_page(&documents).into_response()
        }
        // Page routes never resolve to asset targets.
        Some(_) | None => return render::denial_page(resolution.verdict),
    };
    // Domain-routed HTML is edge-cacheable; denials above stay no-store.
    if domain_routed {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static(render::DOMAIN_CACHE_CONTROL),
        );
    }
    response
}
