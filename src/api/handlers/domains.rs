//! Custom-domain resolution for the edge.
//!
//! `GET /api/custom-domain?_host=<hostname>&path=<segments>` renders the
//! content a custom domain is bound to. The edge proxy forwards the
//! original hostname in `_host` because the request itself arrives on the
//! platform's own host. Successful HTML carries a short shared-cache
//! directive so the edge can absorb repeat traffic.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use super::{credentials, CredentialQuery};
use crate::api::SharedState;
use crate::error::Result;

pub fn router() -> Router<SharedState> {
    Router::new().route("/api/custom-domain", get(resolve_custom_domain))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CustomDomainQuery {
    /// Hostname the original request arrived on.
    #[serde(rename = "_host")]
    pub host: String,
    /// Path on the custom domain, e.g. `launch-notes`. Defaults to the root.
    pub path: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

/// Resolve content for a custom domain.
#[utoipa::path(
    get,
    path = "/api/custom-domain",
    tag = "domains",
    params(CustomDomainQuery),
    responses(
        (status = 200, description = "Rendered document or landing HTML"),
        (status = 401, description = "Password required"),
        (status = 403, description = "Content is private"),
        (status = 404, description = "No verified binding, or no content"),
        (status = 410, description = "Content has expired"),
    )
)]
async fn resolve_custom_domain(
    State(state): State<SharedState>,
    Query(query): Query<CustomDomainQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let cred_query = CredentialQuery {
        password: query.password.clone(),
        email: query.email.clone(),
    };
    let creds = credentials(&cred_query, &headers);

    let path = query.path.as_deref().unwrap_or("");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let host = query.host.to_lowercase();
    let resolution = state
        .resolver
        .resolve_domain(&host, &segments, &creds)
        .await?;
    // The resolution's render hint carries the edge-cache directive.
    Ok(super::pages::render_page(resolution))
}

#[derive(OpenApi)]
#[openapi(paths(resolve_custom_domain))]
pub struct DomainsApiDoc;
