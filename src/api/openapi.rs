//! OpenAPI specification generated from handler annotations via utoipa.

use axum::Json;
use utoipa::OpenApi;

/// Top-level OpenAPI document for the delivery API.
///
/// Each handler module contributes its own paths and schemas via per-module
/// `#[derive(OpenApi)]` structs merged into this root document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Paperhost Delivery API",
        description = "Public content resolution and delivery engine.",
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "health", description = "Health and readiness checks"),
        (name = "domains", description = "Custom-domain resolution"),
        (name = "webhooks", description = "Webhook delivery"),
    ),
    components(schemas(ErrorResponse))
)]
pub struct ApiDoc;

/// Standard error response body returned by JSON endpoints on failure.
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "NOT_FOUND", "VALIDATION_ERROR")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Build the merged OpenAPI document from all handler modules.
pub fn build_openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(super::handlers::health::HealthApiDoc::openapi());
    doc.merge(super::handlers::domains::DomainsApiDoc::openapi());
    doc.merge(super::handlers::webhooks::WebhooksApiDoc::openapi());
    doc
}

/// Serve the OpenAPI document as JSON.
pub async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(build_openapi())
}
