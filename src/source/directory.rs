use std::path::PathBuf;

use async_trait::async_trait;

use super::{DataSource, Resource, ResourceNames};
use crate::errors::{FetchError, FetchResult};

/// Static JSON resources in a local directory.
pub struct DirectorySource {
    root: PathBuf,
    names: ResourceNames,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, names: ResourceNames) -> Self {
        Self {
            root: root.into(),
            names,
        }
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    async fn fetch_raw(&self, resource: Resource) -> FetchResult<String> {
        let name = self.names.name(resource);
        let path = self.root.join(name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Unavailable {
                resource: name.to_string(),
                reason: e.to_string(),
            })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
