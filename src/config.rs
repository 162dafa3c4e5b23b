use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::drag::CanvasBounds;
use crate::errors::{ConfigError, ConfigResult};
use crate::reconcile::MatchStrategy;
use crate::source::ResourceNames;

/// ## Structure
///
/// ```text
/// DashboardConfig
///   ├── refresh_interval_ms: u64         (30000)
///   ├── fetch_timeout_ms: u64            (10000)
///   ├── source: SourceConfig
///   │   ├── Directory { path, resources }
///   │   └── Http { base_url, resources }
///   ├── storage_dir: PathBuf             (.route-atlas)
///   ├── match_strategy: MatchStrategy    (cardinality | id_set)
///   └── canvas: CanvasBounds             (800 x 500, margin 25)
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub refresh_interval_ms: u64,
    pub fetch_timeout_ms: u64,
    pub source: SourceConfig,
    pub storage_dir: PathBuf,
    pub match_strategy: MatchStrategy,
    pub canvas: CanvasBounds,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Directory {
        path: PathBuf,
        #[serde(default)]
        resources: ResourceNames,
    },
    Http {
        base_url: String,
        #[serde(default)]
        resources: ResourceNames,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Directory {
            path: PathBuf::from("data"),
            resources: ResourceNames::default(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 30_000,
            fetch_timeout_ms: 10_000,
            source: SourceConfig::default(),
            storage_dir: PathBuf::from(".route-atlas"),
            match_strategy: MatchStrategy::default(),
            canvas: CanvasBounds::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: DashboardConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_ms must be positive".to_string(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_ms must be positive".to_string(),
            ));
        }
        self.canvas.validate()?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
