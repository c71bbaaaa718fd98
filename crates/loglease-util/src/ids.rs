//! Strongly-typed identifiers for loglease

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a lease record in the lease store.
///
/// Chosen by the operator (e.g. `deploy-debug-2024`); the same id must be
/// used by the capture session and by the `lease extend`/`lease expire`
/// tooling that manipulates the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(String);

impl LeaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for LeaseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LeaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for one capture/demo session.
///
/// Attached as a label to every shipped entry so entries from concurrent
/// sessions against the same lease can be told apart in the sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_id_roundtrip() {
        let id = LeaseId::new("deploy-debug");
        assert_eq!(id.as_str(), "deploy-debug");
        assert_eq!(id.to_string(), "deploy-debug");
        assert_eq!(LeaseId::from("deploy-debug"), id);
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
