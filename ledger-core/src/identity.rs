//! Identity types for ledgers

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Tag carried by every ledger identifier.
pub const LEDGER_ID_PREFIX: &str = "ldg_";

/// Ledger identifier: `ldg_` followed by a UUIDv7.
///
/// UUIDv7 embeds a Unix timestamp, so identifiers generated by one process
/// sort roughly by creation time. Uniqueness is statistical (random bits),
/// not coordinated between concurrent creators.
///
/// The `Default` value is the empty identifier. No persisted ledger ever
/// carries it; it only shows up as the zero value of a placeholder record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(String);

impl LedgerId {
    /// Generate a fresh, prefixed identifier.
    pub fn generate() -> Self {
        Self(format!("{}{}", LEDGER_ID_PREFIX, Uuid::now_v7()))
    }

    /// Wrap an identifier read back from storage or supplied by a caller.
    ///
    /// No validation happens here: an unknown id is a lookup miss, not a
    /// parse error.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the identifier carries the ledger tag.
    pub fn has_ledger_prefix(&self) -> bool {
        self.0.len() > LEDGER_ID_PREFIX.len() && self.0.starts_with(LEDGER_ID_PREFIX)
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LedgerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for LedgerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for LedgerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_id_is_prefixed() {
        let id = LedgerId::generate();
        assert!(!id.is_empty());
        assert!(id.has_ledger_prefix());
        assert!(id.as_str().starts_with("ldg_"));

        let uuid_part = &id.as_str()[LEDGER_ID_PREFIX.len()..];
        let parsed = Uuid::parse_str(uuid_part).expect("suffix should be a uuid");
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<LedgerId> = (0..1000).map(|_| LedgerId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_default_is_empty() {
        let id = LedgerId::default();
        assert!(id.is_empty());
        assert!(!id.has_ledger_prefix());
    }

    #[test]
    fn test_bare_prefix_is_not_a_ledger_id() {
        assert!(!LedgerId::new("ldg_").has_ledger_prefix());
        assert!(!LedgerId::new("acc_123").has_ledger_prefix());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = LedgerId::new("ldg_abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ldg_abc\"");
        let back: LedgerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
