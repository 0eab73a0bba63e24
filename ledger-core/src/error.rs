//! Error types for ledger operations

use thiserror::Error;

use crate::LedgerId;

/// Errors surfaced to callers of the store and the read-through accessor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Metadata could not be encoded or decoded. Stored metadata that fails
    /// to decode is data corruption, never a "not found".
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    #[error("Store write failed: {reason}")]
    StoreWrite { reason: String },

    #[error("Store read failed: {reason}")]
    StoreRead { reason: String },

    #[error("Ledger with ID '{id}' not found")]
    NotFound { id: LedgerId },

    /// Pool or cache environment could not be set up.
    #[error("Config error: {reason}")]
    Config { reason: String },
}

impl LedgerError {
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    pub fn store_write(reason: impl Into<String>) -> Self {
        Self::StoreWrite {
            reason: reason.into(),
        }
    }

    pub fn store_read(reason: impl Into<String>) -> Self {
        Self::StoreRead {
            reason: reason.into(),
        }
    }

    pub fn not_found(id: &LedgerId) -> Self {
        Self::NotFound { id: id.clone() }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Cache backend errors.
///
/// These never reach callers of the read-through accessor; they are logged
/// and counted at the point of use.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache encode failed: {reason}")]
    Encode { reason: String },

    #[error("Cache decode failed: {reason}")]
    Decode { reason: String },

    #[error("Cache transaction failed: {reason}")]
    Transaction { reason: String },
}

/// Result type alias for store and accessor operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result type alias for cache backend operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = LedgerError::not_found(&LedgerId::new("ldg_missing"));
        let msg = format!("{}", err);
        assert!(msg.contains("not found"));
        assert!(msg.contains("ldg_missing"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_store_errors_are_not_not_found() {
        assert!(!LedgerError::store_read("connection reset").is_not_found());
        assert!(!LedgerError::store_write("duplicate key").is_not_found());
        assert!(!LedgerError::serialization("bad json").is_not_found());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let ledger_err = LedgerError::from(err);
        assert!(matches!(ledger_err, LedgerError::Serialization { .. }));
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::Unavailable {
            reason: "connection refused".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Cache unavailable"));
        assert!(msg.contains("connection refused"));
    }
}
