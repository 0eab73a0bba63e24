//! The ledger record.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{LedgerId, Metadata, Timestamp};

/// A named, metadata-bearing bookkeeping record.
///
/// Ledgers are immutable once created. `id` and `created_at` are only ever
/// assigned by the store at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: LedgerId,
    pub name: String,
    pub metadata: Metadata,
    pub created_at: Timestamp,
}

/// Input for creating a ledger. Carries no identifier or timestamp; those
/// are the store's to assign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLedger {
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewLedger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace the whole metadata document.
    pub fn with_metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Stamp the input with its assigned identity.
    pub fn into_ledger(self, id: LedgerId, created_at: Timestamp) -> Ledger {
        Ledger {
            id,
            name: self.name,
            metadata: self.metadata,
            created_at,
        }
    }
}
