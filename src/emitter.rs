//! Fire-and-forget side effects.
//!
//! View-count increments, analytics writes, and event-driven webhook runs
//! are dispatched as detached tasks: started before the response is
//! returned, never awaited by it. Failures are logged and never alter the
//! HTTP response already being produced.

use std::sync::Arc;

use crate::models::AnalyticsEvent;
use crate::store::{ContentStore, ViewTarget};
use crate::webhooks::WebhookDeliverer;

/// Dispatches best-effort side effects after successful resolutions.
#[derive(Clone)]
pub struct SideEffectEmitter {
    store: Arc<dyn ContentStore>,
    deliverer: Arc<WebhookDeliverer>,
}

impl SideEffectEmitter {
    pub fn new(store: Arc<dyn ContentStore>, deliverer: Arc<WebhookDeliverer>) -> Self {
        Self { store, deliverer }
    }

    /// Schedule a view-count increment. Duplicate or lost increments under
    /// race are acceptable; these are counters, not a ledger.
    pub fn record_view(&self, target: ViewTarget) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.increment_view_count(target).await {
                tracing::warn!(view_target = ?target, error = %e, "View-count increment failed");
            }
        });
    }

    /// Schedule an analytics-event write.
    pub fn record_event(&self, event: AnalyticsEvent) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.insert_analytics_event(&event).await {
                tracing::warn!(event_type = %event.event_type, error = %e, "Analytics write failed");
            }
        });
    }

    /// Schedule a full webhook delivery run for an internal event such as
    /// `document.viewed`. The synchronous report is discarded; per-attempt
    /// accounting still lands in the store.
    pub fn trigger_webhooks(&self, document_id: uuid::Uuid, event_type: &str, data: serde_json::Value) {
        let deliverer = self.deliverer.clone();
        let event_type = event_type.to_string();
        tokio::spawn(async move {
            match deliverer.deliver(document_id, &event_type, data).await {
                Ok(report) if report.attempted > 0 => {
                    tracing::debug!(
                        document_id = %document_id,
                        event_type = %event_type,
                        attempted = report.attempted,
                        delivered = report.delivered,
                        "Webhook run complete"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        document_id = %document_id,
                        event_type = %event_type,
                        error = %e,
                        "Webhook run failed"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::store::DemoStore;

    #[tokio::test]
    async fn record_view_lands_without_being_awaited() {
        let store = Arc::new(DemoStore::new());
        let deliverer = Arc::new(
            WebhookDeliverer::new(store.clone(), Duration::from_secs(1)).unwrap(),
        );
        let emitter = SideEffectEmitter::new(store.clone(), deliverer);

        let doc = store.document_by_slug("roadmap").await.unwrap().unwrap();
        emitter.record_view(ViewTarget::Document(doc.id));

        // Give the detached task a moment to run.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let again = store.document_by_slug("roadmap").await.unwrap().unwrap();
        assert_eq!(again.view_count, 1);
    }

    #[tokio::test]
    async fn record_event_never_panics_the_caller() {
        let store = Arc::new(DemoStore::new());
        let deliverer = Arc::new(
            WebhookDeliverer::new(store.clone(), Duration::from_secs(1)).unwrap(),
        );
        let emitter = SideEffectEmitter::new(store, deliverer);

        emitter.record_event(AnalyticsEvent::now(
            "document.viewed",
            "document",
            uuid::Uuid::new_v4(),
            None,
        ));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
