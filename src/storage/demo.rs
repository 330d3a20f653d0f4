//! Demo storage backend: deterministic SVG placeholders.

use async_trait::async_trait;
use bytes::Bytes;

use super::StorageBackend;
use crate::error::{AppError, Result};

/// Generates a placeholder SVG for any requested key. Writes are dropped.
#[derive(Default)]
pub struct DemoStorage;

impl DemoStorage {
    pub fn new() -> Self {
        Self
    }
}

/// Deterministic placeholder image labeled with the storage key.
pub fn placeholder_svg(key: &str) -> String {
    let label: String = key
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_'))
        .take(48)
        .collect();
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="360" viewBox="0 0 640 360">
  <rect width="640" height="360" fill="#1f2937"/>
  <rect x="8" y="8" width="624" height="344" fill="none" stroke="#6b7280" stroke-width="2" stroke-dasharray="8 6"/>
  <text x="320" y="170" fill="#e5e7eb" font-family="sans-serif" font-size="22" text-anchor="middle">Paperhost demo asset</text>
  <text x="320" y="205" fill="#9ca3af" font-family="monospace" font-size="14" text-anchor="middle">{label}</text>
</svg>
"##
    )
}

#[async_trait]
impl StorageBackend for DemoStorage {
    async fn put(&self, key: &str, _content: Bytes) -> Result<()> {
        tracing::debug!(key = %key, "Demo storage dropping write");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        if key.is_empty() {
            return Err(AppError::Storage("empty storage key".into()));
        }
        Ok(Bytes::from(placeholder_svg(key)))
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_is_deterministic_svg() {
        let storage = DemoStorage::new();
        let a = storage.get("demo/acme/logo.png").await.unwrap();
        let b = storage.get("demo/acme/logo.png").await.unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(b"<svg"));
    }

    #[test]
    fn label_strips_markup_characters() {
        let svg = placeholder_svg("x/<script>.png");
        assert!(!svg.contains("<script>"));
    }
}
