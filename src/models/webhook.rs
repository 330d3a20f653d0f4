//! Webhook endpoints and delivery accounting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant-configured webhook endpoint, owned by a document.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookEndpoint {
    pub id: Uuid,
    pub document_id: Uuid,
    pub url: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub enabled: bool,
    /// Event names this endpoint subscribes to; "*" subscribes to all.
    pub events: Vec<String>,
    pub failure_count: i32,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WebhookEndpoint {
    /// Whether this endpoint should receive `event_type`.
    pub fn subscribes_to(&self, event_type: &str) -> bool {
        self.events.iter().any(|e| e == event_type || e == "*")
    }
}

/// Append-only record of one delivery attempt. Written regardless of
/// outcome; used for audit, never for control flow.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookDeliveryLog {
    pub endpoint_id: Uuid,
    pub event_type: String,
    pub success: bool,
    pub status_code: Option<i32>,
    pub timestamp: DateTime<Utc>,
}
