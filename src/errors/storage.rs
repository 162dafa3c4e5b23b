//! Errors raised by the durable local store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem read or write failed
    #[error("Storage I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The store refused a write that would exceed its quota
    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    /// Keys map to file names, so path separators are rejected
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    pub fn io(key: &str, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }

    /// Check if the failure is about capacity rather than access
    pub fn is_quota(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "STORAGE_IO",
            StorageError::QuotaExceeded { .. } => "STORAGE_QUOTA",
            StorageError::InvalidKey(_) => "STORAGE_KEY",
        }
    }
}
