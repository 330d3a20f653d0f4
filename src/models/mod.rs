//! Database models (SQLx).

pub mod analytics;
pub mod content;
pub mod domain;
pub mod short_link;
pub mod webhook;

pub use analytics::AnalyticsEvent;
pub use content::{Asset, Collection, Document};
pub use domain::{CustomDomainBinding, DomainTarget, VerificationStatus};
pub use short_link::{ShortLink, ShortLinkTarget};
pub use webhook::{WebhookDeliveryLog, WebhookEndpoint};
