//! Access-control evaluation.
//!
//! `evaluate` is a pure, total function from an entity's policy attributes
//! and the current time to one of six verdicts. The checks run as an ordered
//! table of predicate -> verdict pairs: structural facts (existence,
//! visibility) are checked before temporal and credential facts, so callers
//! always learn the most fundamental reason for denial. A private and
//! expired document reports `Private`, never `Expired`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Asset, Collection, Document, ShortLink};

/// Access-control outcome for a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Ok,
    NotFound,
    Private,
    Expired,
    PasswordRequired,
    ViewLimitExceeded,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "ok",
            Verdict::NotFound => "not_found",
            Verdict::Private => "private",
            Verdict::Expired => "expired",
            Verdict::PasswordRequired => "password_required",
            Verdict::ViewLimitExceeded => "view_limit_exceeded",
        }
    }
}

/// View-budget attributes. Only short links carry a real budget; everything
/// else uses the unconstrained default.
#[derive(Debug, Clone, Copy)]
pub struct ViewBudget {
    pub is_active: bool,
    pub max_views: Option<i64>,
    pub view_count: i64,
}

impl Default for ViewBudget {
    fn default() -> Self {
        Self {
            is_active: true,
            max_views: None,
            view_count: 0,
        }
    }
}

/// Policy attributes extracted from an entity.
#[derive(Debug, Clone, Default)]
pub struct PolicyAttrs {
    /// False for archived assets; absent entities never reach the evaluator
    /// as attrs, but the flag keeps the function total over both cases.
    pub archived: bool,
    pub is_public: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub budget: ViewBudget,
}

/// Credentials supplied with the inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    pub password: Option<String>,
    pub email: Option<String>,
}

type Check = fn(&PolicyAttrs, DateTime<Utc>, &RequestCredentials) -> Option<Verdict>;

/// The precedence contract, in evaluation order. The order is a deliberate
/// design choice, not incidental; tests pin it.
const CHECKS: &[Check] = &[
    check_archived,
    check_visibility,
    check_expiry,
    check_view_budget,
    check_password,
];

/// Evaluate the policy attributes against the current time and request
/// credentials. Deterministic and total: every input yields exactly one of
/// the six verdicts.
pub fn evaluate(attrs: &PolicyAttrs, now: DateTime<Utc>, creds: &RequestCredentials) -> Verdict {
    for check in CHECKS {
        if let Some(verdict) = check(attrs, now, creds) {
            return verdict;
        }
    }
    Verdict::Ok
}

fn check_archived(attrs: &PolicyAttrs, _: DateTime<Utc>, _: &RequestCredentials) -> Option<Verdict> {
    attrs.archived.then_some(Verdict::NotFound)
}

fn check_visibility(
    attrs: &PolicyAttrs,
    _: DateTime<Utc>,
    _: &RequestCredentials,
) -> Option<Verdict> {
    (!attrs.is_public).then_some(Verdict::Private)
}

fn check_expiry(attrs: &PolicyAttrs, now: DateTime<Utc>, _: &RequestCredentials) -> Option<Verdict> {
    match attrs.expires_at {
        Some(expires) if expires < now => Some(Verdict::Expired),
        _ => None,
    }
}

fn check_view_budget(
    attrs: &PolicyAttrs,
    _: DateTime<Utc>,
    _: &RequestCredentials,
) -> Option<Verdict> {
    let budget = &attrs.budget;
    if !budget.is_active {
        return Some(Verdict::ViewLimitExceeded);
    }
    match budget.max_views {
        Some(max) if budget.view_count >= max => Some(Verdict::ViewLimitExceeded),
        _ => None,
    }
}

fn check_password(
    attrs: &PolicyAttrs,
    _: DateTime<Utc>,
    creds: &RequestCredentials,
) -> Option<Verdict> {
    let hash = attrs.password_hash.as_deref()?;
    match creds.password.as_deref() {
        Some(candidate) if bcrypt::verify(candidate, hash).unwrap_or(false) => None,
        _ => Some(Verdict::PasswordRequired),
    }
}

/// Email allowlist gate, layered after the main verdict. Applied by the
/// caller only when `evaluate` returned `Ok` and the entity carries a
/// non-empty allowlist.
pub fn email_allowed(allowed: &[String], creds: &RequestCredentials) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match creds.email.as_deref() {
        Some(email) => {
            let email = email.to_lowercase();
            allowed.iter().any(|a| a.to_lowercase() == email)
        }
        None => false,
    }
}

impl From<&Document> for PolicyAttrs {
    fn from(doc: &Document) -> Self {
        Self {
            archived: false,
            is_public: doc.is_public,
            expires_at: doc.expires_at,
            password_hash: doc.password_hash.clone(),
            budget: ViewBudget::default(),
        }
    }
}

impl From<&Collection> for PolicyAttrs {
    fn from(col: &Collection) -> Self {
        Self {
            archived: false,
            is_public: col.is_public,
            expires_at: col.expires_at,
            password_hash: col.password_hash.clone(),
            budget: ViewBudget::default(),
        }
    }
}

impl From<&Asset> for PolicyAttrs {
    fn from(asset: &Asset) -> Self {
        Self {
            archived: asset.archived,
            is_public: asset.is_public,
            expires_at: asset.expires_at,
            password_hash: None,
            budget: ViewBudget::default(),
        }
    }
}

impl From<&ShortLink> for PolicyAttrs {
    fn from(link: &ShortLink) -> Self {
        Self {
            archived: false,
            // Short links are only ever minted against shareable targets;
            // the link itself has no visibility flag.
            is_public: true,
            expires_at: link.expires_at,
            password_hash: link.password_hash.clone(),
            budget: ViewBudget {
                is_active: link.is_active,
                max_views: link.max_views,
                view_count: link.view_count,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn public_attrs() -> PolicyAttrs {
        PolicyAttrs {
            archived: false,
            is_public: true,
            expires_at: None,
            password_hash: None,
            budget: ViewBudget::default(),
        }
    }

    fn no_creds() -> RequestCredentials {
        RequestCredentials::default()
    }

    #[test]
    fn public_entity_is_ok() {
        assert_eq!(
            evaluate(&public_attrs(), Utc::now(), &no_creds()),
            Verdict::Ok
        );
    }

    #[test]
    fn archived_is_not_found() {
        let mut attrs = public_attrs();
        attrs.archived = true;
        assert_eq!(
            evaluate(&attrs, Utc::now(), &no_creds()),
            Verdict::NotFound
        );
    }

    #[test]
    fn private_beats_expired() {
        let mut attrs = public_attrs();
        attrs.is_public = false;
        attrs.expires_at = Some(Utc::now() - Duration::hours(1));
        assert_eq!(evaluate(&attrs, Utc::now(), &no_creds()), Verdict::Private);
    }

    #[test]
    fn expired_beats_password_required() {
        let mut attrs = public_attrs();
        attrs.expires_at = Some(Utc::now() - Duration::hours(1));
        attrs.password_hash = Some("$2b$04$invalid".into());
        assert_eq!(evaluate(&attrs, Utc::now(), &no_creds()), Verdict::Expired);
    }

    #[test]
    fn future_expiry_is_not_expired() {
        let mut attrs = public_attrs();
        attrs.expires_at = Some(Utc::now() + Duration::hours(1));
        assert_eq!(evaluate(&attrs, Utc::now(), &no_creds()), Verdict::Ok);
    }

    #[test]
    fn view_limit_boundary() {
        let mut attrs = public_attrs();
        attrs.budget = ViewBudget {
            is_active: true,
            max_views: Some(5),
            view_count: 5,
        };
        assert_eq!(
            evaluate(&attrs, Utc::now(), &no_creds()),
            Verdict::ViewLimitExceeded
        );

        attrs.budget.view_count = 4;
        assert_eq!(evaluate(&attrs, Utc::now(), &no_creds()), Verdict::Ok);
    }

    #[test]
    fn inactive_link_is_view_limit_exceeded() {
        let mut attrs = public_attrs();
        attrs.budget.is_active = false;
        assert_eq!(
            evaluate(&attrs, Utc::now(), &no_creds()),
            Verdict::ViewLimitExceeded
        );
    }

    #[test]
    fn view_limit_beats_password() {
        let mut attrs = public_attrs();
        attrs.budget.is_active = false;
        attrs.password_hash = Some("$2b$04$invalid".into());
        assert_eq!(
            evaluate(&attrs, Utc::now(), &no_creds()),
            Verdict::ViewLimitExceeded
        );
    }

    #[test]
    fn password_required_without_candidate() {
        let mut attrs = public_attrs();
        attrs.password_hash = Some(bcrypt::hash("letmein", 4).unwrap());
        assert_eq!(
            evaluate(&attrs, Utc::now(), &no_creds()),
            Verdict::PasswordRequired
        );
    }

    #[test]
    fn correct_password_unlocks() {
        let mut attrs = public_attrs();
        attrs.password_hash = Some(bcrypt::hash("letmein", 4).unwrap());
        let creds = RequestCredentials {
            password: Some("letmein".into()),
            email: None,
        };
        assert_eq!(evaluate(&attrs, Utc::now(), &creds), Verdict::Ok);
    }

    #[test]
    fn wrong_password_stays_locked() {
        let mut attrs = public_attrs();
        attrs.password_hash = Some(bcrypt::hash("letmein", 4).unwrap());
        let creds = RequestCredentials {
            password: Some("guess".into()),
            email: None,
        };
        assert_eq!(evaluate(&attrs, Utc::now(), &creds), Verdict::PasswordRequired);
    }

    #[test]
    fn email_allowlist_is_case_insensitive() {
        let allowed = vec!["Alice@Example.com".to_string()];
        let creds = RequestCredentials {
            password: None,
            email: Some("alice@example.com".into()),
        };
        assert!(email_allowed(&allowed, &creds));
        assert!(!email_allowed(&allowed, &no_creds()));
        assert!(email_allowed(&[], &no_creds()));
    }
}
