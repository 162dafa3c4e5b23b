//! Read-only access to the authoritative JSON resources.

pub mod directory;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;

pub use directory::DirectorySource;
#[cfg(feature = "http")]
pub use http::HttpSource;
pub use memory::InMemorySource;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{FetchError, FetchResult};
use crate::model::{CdConnection, DeliveryPoint, DistributionCenter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Cds,
    DeliveryPoints,
    Connections,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Cds => write!(f, "cds"),
            Resource::DeliveryPoints => write!(f, "delivery points"),
            Resource::Connections => write!(f, "cd connections"),
        }
    }
}

/// File names of the three resources, relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceNames {
    pub cds: String,
    pub delivery_points: String,
    pub connections: String,
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self {
            cds: "cds.json".to_string(),
            delivery_points: "delivery-points.json".to_string(),
            connections: "cd-connections.json".to_string(),
        }
    }
}

impl ResourceNames {
    pub fn name(&self, resource: Resource) -> &str {
        match resource {
            Resource::Cds => &self.cds,
            Resource::DeliveryPoints => &self.delivery_points,
            Resource::Connections => &self.connections,
        }
    }
}

/// One authoritative fetch of all three collections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub cds: Vec<DistributionCenter>,
    pub delivery_points: Vec<DeliveryPoint>,
    pub connections: Vec<CdConnection>,
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the raw body of one resource.
    async fn fetch_raw(&self, resource: Resource) -> FetchResult<String>;

    fn describe(&self) -> String;
}

pub type SnapshotFuture = Pin<Box<dyn Future<Output = FetchResult<Snapshot>> + Send>>;

/// Fetch the three resources concurrently; any failure or the timeout fails
/// the whole snapshot.
pub async fn fetch_snapshot(source: &dyn DataSource, timeout: Duration) -> FetchResult<Snapshot> {
    let fetch_all = async {
        tokio::try_join!(
            fetch_collection::<DistributionCenter>(source, Resource::Cds),
            fetch_collection::<DeliveryPoint>(source, Resource::DeliveryPoints),
            fetch_collection::<CdConnection>(source, Resource::Connections),
        )
    };

    let (cds, delivery_points, connections) = tokio::time::timeout(timeout, fetch_all)
        .await
        .map_err(|_| FetchError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        })??;

    debug!(
        "Fetched snapshot from {}: {} cds, {} delivery points, {} connections",
        source.describe(),
        cds.len(),
        delivery_points.len(),
        connections.len()
    );

    Ok(Snapshot {
        cds,
        delivery_points,
        connections,
    })
}

/// Owned variant of [`fetch_snapshot`] that can be kept in flight while other
/// events are handled.
pub fn owned_fetch(source: Arc<dyn DataSource>, timeout: Duration) -> SnapshotFuture {
    Box::pin(async move { fetch_snapshot(source.as_ref(), timeout).await })
}

async fn fetch_collection<T: DeserializeOwned>(
    source: &dyn DataSource,
    resource: Resource,
) -> FetchResult<Vec<T>> {
    let body = source.fetch_raw(resource).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Parse {
        resource: resource.to_string(),
        reason: e.to_string(),
    })
}
