use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{DataSource, Resource, Snapshot};
use crate::errors::{FetchError, FetchResult};

/// Serves a snapshot held in memory, with knobs for failure and latency.
///
/// Clones share state so a caller can change the served data after handing
/// the source to an engine.
#[derive(Clone, Default)]
pub struct InMemorySource {
    inner: Arc<Mutex<InMemoryInner>>,
}

#[derive(Default)]
struct InMemoryInner {
    snapshot: Snapshot,
    failing: Option<Resource>,
    delay: Option<Duration>,
    snapshot_requests: usize,
}

impl InMemorySource {
    pub fn new(snapshot: Snapshot) -> Self {
        let source = Self::default();
        source.lock().snapshot = snapshot;
        source
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        self.lock().snapshot = snapshot;
    }

    /// Make fetches of `resource` answer with HTTP 503.
    pub fn fail_resource(&self, resource: Option<Resource>) {
        self.lock().failing = resource;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Number of times the CD resource was requested, one per snapshot.
    pub fn snapshot_requests(&self) -> usize {
        self.lock().snapshot_requests
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DataSource for InMemorySource {
    async fn fetch_raw(&self, resource: Resource) -> FetchResult<String> {
        let (delay, body) = {
            let mut inner = self.lock();
            if resource == Resource::Cds {
                inner.snapshot_requests += 1;
            }
            if inner.failing == Some(resource) {
                return Err(FetchError::Status {
                    resource: resource.to_string(),
                    status: 503,
                });
            }
            let body = match resource {
                Resource::Cds => serde_json::to_string(&inner.snapshot.cds),
                Resource::DeliveryPoints => serde_json::to_string(&inner.snapshot.delivery_points),
                Resource::Connections => serde_json::to_string(&inner.snapshot.connections),
            };
            (inner.delay, body)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        body.map_err(|e| FetchError::Unavailable {
            resource: resource.to_string(),
            reason: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
