//! Asset delivery.
//!
//! Any request with two or more path segments serves asset bytes addressed
//! by their full public path, with optional on-the-fly transformation via
//! query parameters. HEAD runs the same resolution and transform and
//! returns headers only.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use super::{credentials, request_host, CredentialQuery};
use crate::api::{render, SharedState};
use crate::error::Result;
use crate::models::Asset;
use crate::resolver::ResolvedTarget;
use crate::transform::{transform, TransformParams};

// The first segment shares its parameter name with the page route; the
// router requires consistent names at the same position.
pub fn router() -> Router<SharedState> {
    Router::new().route("/{slug}/{*path}", get(serve_asset))
}

/// Transform and credential query parameters for asset routes.
#[derive(Debug, Default, Deserialize)]
pub struct AssetQuery {
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub q: Option<u8>,
    pub f: Option<String>,
    pub fit: Option<String>,
    pub g: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

impl AssetQuery {
    fn transform_params(&self) -> TransformParams {
        TransformParams::from_raw(
            self.w,
            self.h,
            self.q,
            self.f.as_deref(),
            self.fit.as_deref(),
            self.g.as_deref(),
        )
    }

    fn credential_query(&self) -> CredentialQuery {
        CredentialQuery {
            password: self.password.clone(),
            email: self.email.clone(),
        }
    }
}

async fn serve_asset(
    State(state): State<SharedState>,
    method: Method,
    Path((owner, path)): Path<(String, String)>,
    Query(query): Query<AssetQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let creds = credentials(&query.credential_query(), &headers);
    let host = request_host(&headers);
    let public_path = format!("{owner}/{path}");

    let resolution = state
        .resolver
        .resolve_asset(&public_path, host.as_deref(), &creds)
        .await?;

    let asset = match resolution.target {
        Some(ResolvedTarget::Asset(asset)) => asset,
        _ => {
            let status = render::verdict_status(resolution.verdict);
            return Ok(if method == Method::HEAD {
                status.into_response()
            } else {
                (status, resolution.verdict.as_str().to_string()).into_response()
            });
        }
    };

    serve_bytes(&state, &asset, &query.transform_params(), method == Method::HEAD).await
}

/// Fetch, transform, and wrap asset bytes with the headers of record.
/// Shared with the short-link route.
pub(super) async fn serve_bytes(
    state: &SharedState,
    asset: &Asset,
    params: &TransformParams,
    head: bool,
) -> Result<Response> {
    let stored = state.storage.get(&asset.storage_key).await?;
    let output = transform(stored, &asset.mime_type, params);

    let mut response = if head {
        StatusCode::OK.into_response()
    } else {
        output.bytes.clone().into_response()
    };
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, output.mime_type.parse().map_err(
        |_| crate::error::AppError::Internal(format!("invalid MIME type {}", output.mime_type)),
    )?);
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static(output.cache_control));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::ACCEPT_RANGES,
        header::HeaderValue::from_static("bytes"),
    );
    // HEAD carries the length the matching GET would have.
    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(output.bytes.len()));
    Ok(response)
}
