//! Analytics events emitted on successful resolutions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Best-effort analytics record. Lost or duplicated events under race are
/// acceptable; these are counters, not a ledger.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub event_type: String,
    /// "document", "collection", "asset", or "short_link"
    pub target_kind: String,
    pub target_id: Uuid,
    pub hostname: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    /// Create an event timestamped to now.
    pub fn now(
        event_type: impl Into<String>,
        target_kind: impl Into<String>,
        target_id: Uuid,
        hostname: Option<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            target_kind: target_kind.into(),
            target_id,
            hostname,
            occurred_at: Utc::now(),
        }
    }
}
