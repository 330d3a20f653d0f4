//! Customer-owned domain bindings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Ownership verification state of a domain binding. Only `Verified`
/// bindings resolve traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
}

/// Maps a verified hostname to a single document or a whole workspace.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CustomDomainBinding {
    pub id: Uuid,
    /// Lower-cased, unique hostname
    pub hostname: String,
    pub document_id: Option<Uuid>,
    pub workspace_id: Option<Uuid>,
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
}

/// What a domain binding routes to. Exactly one of `document_id`/
/// `workspace_id` is set on a well-formed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainTarget {
    Document(Uuid),
    Workspace(Uuid),
}

impl CustomDomainBinding {
    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }

    /// Resolve the bound target, rejecting malformed rows.
    pub fn target(&self) -> Option<DomainTarget> {
        match (self.document_id, self.workspace_id) {
            (Some(id), None) => Some(DomainTarget::Document(id)),
            (None, Some(id)) => Some(DomainTarget::Workspace(id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_requires_exactly_one_binding() {
        let d = Uuid::new_v4();
        let w = Uuid::new_v4();
        let mut binding = CustomDomainBinding {
            id: Uuid::new_v4(),
            hostname: "docs.acme.example".into(),
            document_id: Some(d),
            workspace_id: None,
            status: VerificationStatus::Verified,
            created_at: Utc::now(),
        };
        assert_eq!(binding.target(), Some(DomainTarget::Document(d)));

        binding.document_id = None;
        binding.workspace_id = Some(w);
        assert_eq!(binding.target(), Some(DomainTarget::Workspace(w)));

        binding.workspace_id = None;
        assert_eq!(binding.target(), None);
    }
}
