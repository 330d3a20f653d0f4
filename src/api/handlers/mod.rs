//! HTTP handlers, one module per surface.

pub mod assets;
pub mod domains;
pub mod health;
pub mod links;
pub mod pages;
pub mod webhooks;

use axum::http::{header, HeaderMap};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::access::RequestCredentials;

/// Credential query parameters accepted by every content route.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CredentialQuery {
    pub password: Option<String>,
    pub email: Option<String>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Assemble request credentials. Headers win over query parameters so
/// credentials can be kept out of shareable URLs.
pub fn credentials(query: &CredentialQuery, headers: &HeaderMap) -> RequestCredentials {
    RequestCredentials {
        password: header_value(headers, "x-content-password").or_else(|| query.password.clone()),
        email: header_value(headers, "x-viewer-email").or_else(|| query.email.clone()),
    }
}

/// Request hostname from the Host header, lower-cased, port stripped.
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::HOST)?.to_str().ok()?;
    let host = raw.split(':').next().unwrap_or(raw).trim();
    if host.is_empty() {
        return None;
    }
    Some(host.to_lowercase())
}
