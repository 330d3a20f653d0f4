//! Short-link tokens.
//!
//! Short links live in their own slug namespace, reference exactly one asset
//! or collection, and carry their own gating attributes (password, expiry,
//! view budget, kill switch).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Short link entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShortLink {
    pub id: Uuid,
    pub slug: String,
    pub asset_id: Option<Uuid>,
    pub collection_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i64>,
    pub view_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// What a short link points at. Exactly one of `asset_id`/`collection_id`
/// is set on a well-formed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortLinkTarget {
    Asset(Uuid),
    Collection(Uuid),
}

impl ShortLink {
    /// Resolve the referenced target, rejecting malformed rows.
    pub fn target(&self) -> Option<ShortLinkTarget> {
        match (self.asset_id, self.collection_id) {
            (Some(id), None) => Some(ShortLinkTarget::Asset(id)),
            (None, Some(id)) => Some(ShortLinkTarget::Collection(id)),
            _ => None,
        }
    }

    /// Whether the view budget still has room.
    pub fn within_view_budget(&self) -> bool {
        match self.max_views {
            Some(max) => self.view_count < max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(asset: Option<Uuid>, collection: Option<Uuid>) -> ShortLink {
        ShortLink {
            id: Uuid::new_v4(),
            slug: "tok".into(),
            asset_id: asset,
            collection_id: collection,
            password_hash: None,
            expires_at: None,
            max_views: None,
            view_count: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn target_requires_exactly_one_reference() {
        let a = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert_eq!(
            link(Some(a), None).target(),
            Some(ShortLinkTarget::Asset(a))
        );
        assert_eq!(
            link(None, Some(c)).target(),
            Some(ShortLinkTarget::Collection(c))
        );
        assert_eq!(link(None, None).target(), None);
        assert_eq!(link(Some(a), Some(c)).target(), None);
    }

    #[test]
    fn view_budget_boundary() {
        let mut l = link(Some(Uuid::new_v4()), None);
        l.max_views = Some(5);
        l.view_count = 4;
        assert!(l.within_view_budget());
        l.view_count = 5;
        assert!(!l.within_view_budget());
    }

    #[test]
    fn no_max_views_means_unlimited() {
        let mut l = link(Some(Uuid::new_v4()), None);
        l.view_count = 1_000_000;
        assert!(l.within_view_budget());
    }
}
