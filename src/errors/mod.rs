//! Error types for route-atlas
//!
//! Only fetch failures reach the user-visible error state. Storage problems
//! degrade to safe defaults inside the persistence adapter, and configuration
//! errors stop the binary before the dashboard starts.
//!
//! # Error Categories
//!
//! - **FetchError**: one of the three authoritative resources could not be
//!   fetched or parsed, or the fetch timed out
//! - **StorageError**: the durable local store rejected a read or write
//! - **ConfigError**: the configuration file is unreadable or invalid
//! - **DashboardError**: umbrella type returned by the dashboard loop
//!
//! # Examples
//!
//! ```rust
//! use routeatlas::errors::FetchError;
//!
//! let err = FetchError::Status {
//!     resource: "cds.json".to_string(),
//!     status: 404,
//! };
//! assert_eq!(err.error_code(), "FETCH_FAILED");
//! ```

pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod storage;

pub use config::ConfigError;
pub use dashboard::DashboardError;
pub use fetch::FetchError;
pub use storage::StorageError;

/// Result type alias for data source operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type alias for local store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
