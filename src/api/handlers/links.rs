//! Short-link resolution.
//!
//! `GET /p/{token}` resolves a share token to its asset or collection
//! target. The link's own policy gates access; denials use the same
//! status mapping as document pages.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use super::assets::serve_bytes;
use super::{credentials, request_host, CredentialQuery};
use crate::api::{render, SharedState};
use crate::error::Result;
use crate::resolver::ResolvedTarget;
use crate::transform::TransformParams;

pub fn router() -> Router<SharedState> {
    Router::new().route("/{token}", get(resolve_link))
}

async fn resolve_link(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let creds = credentials(&query, &headers);
    let host = request_host(&headers);

    let resolution = state
        .resolver
        .resolve_short_link(&token, host.as_deref(), &creds)
        .await?;

    match resolution.target {
        Some(ResolvedTarget::LinkedAsset { asset, .. }) => {
            // Shared bytes are served as stored; transformation stays on the
            // direct asset route.
            serve_bytes(&state, &asset, &TransformParams::default(), false).await
        }
        Some(ResolvedTarget::LinkedCollection { collection, .. }) => {
            Ok(render::collection_page(&collection).into_response())
        }
        _ => Ok(render::denial_page(resolution.verdict)),
    }
}
