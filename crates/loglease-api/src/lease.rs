//! The lease document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lease record as stored in the lease store.
///
/// Written by the `lease extend` tooling, deleted by `lease expire`, and
/// observed (never written) by the capture/demo sessions. Field names are
/// PascalCase on the wire; this is the document's external shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LeaseState {
    /// When the lease stops authorizing shipping.
    pub expire_at: DateTime<Utc>,

    /// Who requested the lease (optional, informational).
    #[serde(default)]
    pub user: String,

    /// Why the lease was requested (optional, informational).
    #[serde(default)]
    pub reason: String,
}

impl LeaseState {
    pub fn new(expire_at: DateTime<Utc>) -> Self {
        Self {
            expire_at,
            user: String::new(),
            reason: String::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Whether the lease's own expiry has passed (ignores any guaranteed floor).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at <= now
    }
}
