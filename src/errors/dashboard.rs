use thiserror::Error;

use super::{ConfigError, FetchError, StorageError};

/// Errors surfaced by the dashboard coordinator
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Persisted overrides survived a reset, so the next cycle would restore them
    #[error("Persisted positions could not be cleared")]
    ResetIncomplete,

    /// The configured data source is not compiled into this build
    #[error("Unsupported data source: {0}")]
    UnsupportedSource(String),
}

impl DashboardError {
    /// Only fetch failures belong in the user-visible error state
    pub fn is_user_visible(&self) -> bool {
        matches!(self, DashboardError::Fetch(_))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DashboardError::Fetch(err) => err.error_code(),
            DashboardError::Storage(err) => err.error_code(),
            DashboardError::Config(err) => err.error_code(),
            DashboardError::ResetIncomplete => "RESET_INCOMPLETE",
            DashboardError::UnsupportedSource(_) => "UNSUPPORTED_SOURCE",
        }
    }
}
