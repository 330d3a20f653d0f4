//! Webhook delivery.
//!
//! Signs, sends, and accounts for outbound event notifications. Each
//! invocation is a single best-effort attempt per endpoint: no retries here,
//! re-sends are the caller's responsibility. Endpoint deliveries within one
//! call run concurrently and all complete before the report is returned.

use chrono::Utc;
use futures::future::join_all;
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::json;
use sha2::Sha256;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{WebhookDeliveryLog, WebhookEndpoint};
use crate::store::ContentStore;

type HmacSha256 = Hmac<Sha256>;

/// Per-endpoint outcome of one delivery attempt.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EndpointResult {
    pub endpoint_id: Uuid,
    pub url: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

/// Outcome of one `deliver` call across all eligible endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
    pub results: Vec<EndpointResult>,
}

/// Webhook delivery subsystem.
pub struct WebhookDeliverer {
    store: Arc<dyn ContentStore>,
    client: reqwest::Client,
}

impl WebhookDeliverer {
    pub fn new(store: Arc<dyn ContentStore>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build webhook client: {e}")))?;
        Ok(Self { store, client })
    }

    /// Deliver `event_type` with `data` to every enabled endpoint of the
    /// document that subscribes to it. Every attempt, including SSRF
    /// rejections, produces exactly one delivery-log entry and one endpoint
    /// status update.
    pub async fn deliver(
        &self,
        document_id: Uuid,
        event_type: &str,
        data: serde_json::Value,
    ) -> Result<DeliveryReport> {
        let endpoints = self.store.webhook_endpoints(document_id).await?;
        let eligible: Vec<WebhookEndpoint> = endpoints
            .into_iter()
            .filter(|e| e.enabled && e.subscribes_to(event_type))
            .collect();

        let timestamp = Utc::now().to_rfc3339();
        let envelope = json!({
            "event": event_type,
            "documentId": document_id,
            "timestamp": timestamp,
            "data": data,
        });
        // Sign the exact serialized bytes that go on the wire.
        let body = serde_json::to_vec(&envelope)?;

        let attempts = eligible
            .iter()
            .map(|endpoint| self.deliver_one(endpoint, event_type, &body, &timestamp));
        let results: Vec<EndpointResult> = join_all(attempts).await;

        let delivered = results.iter().filter(|r| r.success).count();
        Ok(DeliveryReport {
            attempted: results.len(),
            delivered,
            results,
        })
    }

    async fn deliver_one(
        &self,
        endpoint: &WebhookEndpoint,
        event_type: &str,
        body: &[u8],
        timestamp: &str,
    ) -> EndpointResult {
        let outcome = match validate_endpoint_url(&endpoint.url) {
            Err(e) => {
                tracing::warn!(
                    endpoint_id = %endpoint.id,
                    url = %endpoint.url,
                    error = %e,
                    "Webhook endpoint rejected by SSRF policy"
                );
                (false, None, Some(e.to_string()))
            }
            Ok(()) => {
                let signature = sign_payload(&endpoint.secret, body);
                let request = self
                    .client
                    .post(&endpoint.url)
                    .header("Content-Type", "application/json")
                    .header("X-Webhook-Signature", signature)
                    .header("X-Webhook-Event", event_type)
                    .header("X-Webhook-Timestamp", timestamp)
                    .body(body.to_vec());

                match request.send().await {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        ((200..300).contains(&status), Some(status), None)
                    }
                    Err(e) => (false, None, Some(e.to_string())),
                }
            }
        };
        let (success, status_code, error) = outcome;

        let now = Utc::now();
        let log = WebhookDeliveryLog {
            endpoint_id: endpoint.id,
            event_type: event_type.to_string(),
            success,
            status_code: status_code.map(i32::from),
            timestamp: now,
        };
        // Accounting failures are logged, never raised: the attempt already
        // happened and its outcome stands.
        if let Err(e) = self.store.insert_webhook_log(&log).await {
            tracing::warn!(endpoint_id = %endpoint.id, error = %e, "Failed to write delivery log");
        }
        if let Err(e) = self.store.update_endpoint_status(endpoint.id, success, now).await {
            tracing::warn!(endpoint_id = %endpoint.id, error = %e, "Failed to update endpoint status");
        }

        EndpointResult {
            endpoint_id: endpoint.id,
            url: endpoint.url.clone(),
            success,
            status_code,
            error,
        }
    }
}

/// HMAC-SHA256 signature over the serialized envelope, in the
/// `sha256=<hex>` wire form.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts any key length");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Validate a webhook URL against the SSRF policy.
///
/// Blocks non-HTTP(S) schemes, loopback, private, link-local (cloud
/// metadata), unspecified and broadcast addresses, and known internal
/// hostnames. An invalid URL is an immediate per-endpoint failure with no
/// network call.
pub fn validate_endpoint_url(url_str: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url_str)
        .map_err(|_| AppError::Validation("Invalid webhook URL".to_string()))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(AppError::Validation(
            "Webhook URL must use http or https".to_string(),
        ));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::Validation("Webhook URL must have a host".to_string()))?;

    // Block known internal/metadata hostnames
    let blocked_hosts = [
        "localhost",
        "metadata.google.internal",
        "metadata.azure.com",
        "169.254.169.254",
        "postgres",
        "redis",
    ];
    let host_lower = host.to_lowercase();
    for blocked in &blocked_hosts {
        if host_lower == *blocked || host_lower.ends_with(&format!(".{}", blocked)) {
            return Err(AppError::Validation(format!(
                "Webhook URL host '{}' is not allowed",
                host
            )));
        }
    }

    // Block private/internal IP ranges. IPv6 literals keep their brackets
    // in the URL host string.
    let ip_literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = ip_literal.parse::<IpAddr>() {
        if is_internal_ip(ip) {
            return Err(AppError::Validation(format!(
                "Webhook URL IP '{}' is not allowed (private/internal network)",
                ip
            )));
        }
    }

    Ok(())
}

fn is_internal_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()              // 127.0.0.0/8
                || v4.is_private()         // 10/8, 172.16/12, 192.168/16
                || v4.is_link_local()      // 169.254/16 (cloud metadata)
                || v4.is_unspecified()      // 0.0.0.0
                || v4.is_broadcast() // 255.255.255.255
        }
        IpAddr::V6(v6) => {
            // IPv4-mapped addresses smuggle a V4 target through the V6 form.
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_internal_ip(IpAddr::V4(mapped));
            }
            let seg = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                || (seg[0] & 0xffc0) == 0xfe80 // fe80::/10 link-local
                || (seg[0] & 0xfe00) == 0xfc00 // fc00::/7 unique local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    use crate::models::{
        AnalyticsEvent, Asset, Collection, CustomDomainBinding, Document, ShortLink,
    };
    use crate::store::ViewTarget;

    #[test]
    fn signature_is_reproducible_by_independent_construction() {
        let secret = "whsec_test_secret";
        let payload = br#"{"event":"document.viewed","documentId":"d-1"}"#;
        let signature = sign_payload(secret, payload);

        // Independent implementation of the same construction.
        let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        let expected = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

        assert_eq!(signature, expected);
        assert!(signature.starts_with("sha256="));
        // Deterministic for fixed inputs.
        assert_eq!(signature, sign_payload(secret, payload));
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let payload = b"payload";
        assert_ne!(sign_payload("a", payload), sign_payload("b", payload));
    }

    #[test]
    fn ssrf_policy_rejects_internal_targets() {
        for url in [
            "http://127.0.0.1/hook",
            "http://localhost/hook",
            "http://10.1.2.3/hook",
            "http://172.16.9.1/hook",
            "http://192.168.0.5/hook",
            "http://169.254.169.254/latest/meta-data/",
            "http://metadata.google.internal/computeMetadata/",
            "http://0.0.0.0/hook",
            "http://[::1]/hook",
            "http://[fe80::1]/hook",
            "http://[fc00::1]/hook",
            "http://[fd12:3456::1]/hook",
            "http://[::ffff:127.0.0.1]/hook",
            "http://[::ffff:10.0.0.1]/hook",
            "ftp://example.com/hook",
            "file:///etc/passwd",
            "not a url",
        ] {
            assert!(validate_endpoint_url(url).is_err(), "should reject {url}");
        }
    }

    #[test]
    fn ssrf_policy_allows_public_targets() {
        for url in [
            "https://hooks.example.com/paperhost",
            "http://93.184.216.34/hook",
            "http://[2001:4860:4860::8888]/hook",
            "https://api.partner.io:8443/events",
        ] {
            assert!(validate_endpoint_url(url).is_ok(), "should allow {url}");
        }
    }

    /// Store stub that records accounting writes.
    struct RecordingStore {
        endpoints: Vec<WebhookEndpoint>,
        logs: Mutex<Vec<WebhookDeliveryLog>>,
        status_updates: Mutex<Vec<(Uuid, bool)>>,
    }

    #[async_trait]
    impl ContentStore for RecordingStore {
        async fn document_by_slug(&self, _: &str) -> Result<Option<Document>> {
            Ok(None)
        }
        async fn document_by_id(&self, _: Uuid) -> Result<Option<Document>> {
            Ok(None)
        }
        async fn document_for_workspace(&self, _: Uuid, _: &str) -> Result<Option<Document>> {
            Ok(None)
        }
        async fn workspace_public_documents(&self, _: Uuid, _: i64) -> Result<Vec<Document>> {
            Ok(Vec::new())
        }
        async fn asset_by_public_path(&self, _: &str) -> Result<Option<Asset>> {
            Ok(None)
        }
        async fn asset_by_id(&self, _: Uuid) -> Result<Option<Asset>> {
            Ok(None)
        }
        async fn collection_by_id(&self, _: Uuid) -> Result<Option<Collection>> {
            Ok(None)
        }
        async fn short_link_by_slug(&self, _: &str) -> Result<Option<ShortLink>> {
            Ok(None)
        }
        async fn domain_binding(&self, _: &str) -> Result<Option<CustomDomainBinding>> {
            Ok(None)
        }
        async fn increment_view_count(&self, _: ViewTarget) -> Result<()> {
            Ok(())
        }
        async fn insert_analytics_event(&self, _: &AnalyticsEvent) -> Result<()> {
            Ok(())
        }
        async fn webhook_endpoints(&self, _: Uuid) -> Result<Vec<WebhookEndpoint>> {
            Ok(self.endpoints.clone())
        }
        async fn insert_webhook_log(&self, entry: &WebhookDeliveryLog) -> Result<()> {
            self.logs.lock().unwrap().push(entry.clone());
            Ok(())
        }
        async fn update_endpoint_status(
            &self,
            endpoint_id: Uuid,
            success: bool,
            _at: DateTime<Utc>,
        ) -> Result<()> {
            self.status_updates.lock().unwrap().push((endpoint_id, success));
            Ok(())
        }
    }

    fn endpoint(url: &str, events: Vec<&str>, enabled: bool) -> WebhookEndpoint {
        WebhookEndpoint {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            url: url.to_string(),
            secret: "secret".into(),
            enabled,
            events: events.into_iter().map(String::from).collect(),
            failure_count: 0,
            last_triggered_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ssrf_rejection_is_a_logged_failure_without_network() {
        let ep = endpoint("http://169.254.169.254/hook", vec!["*"], true);
        let ep_id = ep.id;
        let store = Arc::new(RecordingStore {
            endpoints: vec![ep],
            logs: Mutex::new(Vec::new()),
            status_updates: Mutex::new(Vec::new()),
        });
        let deliverer =
            WebhookDeliverer::new(store.clone(), Duration::from_secs(1)).unwrap();

        let report = deliverer
            .deliver(Uuid::new_v4(), "document.viewed", json!({}))
            .await
            .unwrap();

        assert_eq!(report.attempted, 1);
        assert_eq!(report.delivered, 0);
        assert!(!report.results[0].success);
        assert!(report.results[0].status_code.is_none());

        let logs = store.logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].endpoint_id, ep_id);
        assert!(!logs[0].success);

        let updates = store.status_updates.lock().unwrap();
        assert_eq!(updates.as_slice(), &[(ep_id, false)]);
    }

    #[tokio::test]
    async fn disabled_and_unsubscribed_endpoints_are_skipped() {
        let store = Arc::new(RecordingStore {
            endpoints: vec![
                endpoint("https://hooks.example.com/a", vec!["document.viewed"], false),
                endpoint("https://hooks.example.com/b", vec!["lead.captured"], true),
            ],
            logs: Mutex::new(Vec::new()),
            status_updates: Mutex::new(Vec::new()),
        });
        let deliverer =
            WebhookDeliverer::new(store.clone(), Duration::from_secs(1)).unwrap();

        let report = deliverer
            .deliver(Uuid::new_v4(), "document.viewed", json!({}))
            .await
            .unwrap();

        assert_eq!(report.attempted, 0);
        assert!(store.logs.lock().unwrap().is_empty());
    }
}
