use async_trait::async_trait;
use tracing::debug;

use super::{DataSource, Resource, ResourceNames};
use crate::errors::{FetchError, FetchResult};

/// JSON resources served over HTTP under a common base URL.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    names: ResourceNames,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, names: ResourceNames) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            names,
        }
    }

    fn url_for(&self, resource: Resource) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.names.name(resource).trim_start_matches('/')
        )
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_raw(&self, resource: Resource) -> FetchResult<String> {
        let name = self.names.name(resource).to_string();
        let url = self.url_for(resource);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Unavailable {
                resource: name.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource: name,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Unavailable {
            resource: name,
            reason: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
