//! Manual webhook triggering.
//!
//! `POST /api/documents/{document_id}/webhooks/trigger` runs one delivery
//! pass across the document's endpoints and returns the synchronous report.
//! Unlike the event-driven path, failures here surface to the caller.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::SharedState;
use crate::error::Result;
use crate::webhooks::{DeliveryReport, EndpointResult};

pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/api/documents/{document_id}/webhooks/trigger",
        post(trigger_webhooks),
    )
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TriggerRequest {
    /// Event type to deliver. Defaults to `manual.trigger`.
    pub event: Option<String>,
    /// Arbitrary payload forwarded in the envelope's `data` field.
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

/// Trigger a delivery run for a document's webhook endpoints.
#[utoipa::path(
    post,
    path = "/api/documents/{document_id}/webhooks/trigger",
    tag = "webhooks",
    params(
        ("document_id" = Uuid, Path, description = "Document whose endpoints to deliver to")
    ),
    request_body = TriggerRequest,
    responses(
        (status = 200, description = "Delivery report", body = DeliveryReport),
        (status = 500, description = "Store failure during delivery accounting")
    )
)]
async fn trigger_webhooks(
    State(state): State<SharedState>,
    Path(document_id): Path<Uuid>,
    body: Option<Json<TriggerRequest>>,
) -> Result<Json<DeliveryReport>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let event = request.event.unwrap_or_else(|| "manual.trigger".to_string());
    let data = request.data.unwrap_or_else(|| serde_json::json!({}));

    let report = state.deliverer.deliver(document_id, &event, data).await?;
    Ok(Json(report))
}

#[derive(OpenApi)]
#[openapi(
    paths(trigger_webhooks),
    components(schemas(TriggerRequest, DeliveryReport, EndpointResult))
)]
pub struct WebhooksApiDoc;
