//! Merging authoritative data with persisted layout overrides.
//!
//! Each relocatable collection is decided independently: if a persisted copy
//! is compatible with the freshly fetched one it is used verbatim, otherwise
//! the authoritative collection wins and replaces the stale override.
//! Connections are never persisted and always come from the fetch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::errors::FetchResult;
use crate::model::LocatedEntity;
use crate::persistence::PersistenceAdapter;
use crate::routes::RouteSet;
use crate::source::{fetch_snapshot, owned_fetch, DataSource, Snapshot, SnapshotFuture};
use crate::store::EntityStore;

/// How a persisted collection is judged to be "the same dataset, moved".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Equal length only.
    #[default]
    Cardinality,
    /// Equal length and exactly the same set of ids.
    IdSet,
}

impl MatchStrategy {
    pub fn is_compatible<T: LocatedEntity>(&self, authoritative: &[T], persisted: &[T]) -> bool {
        if authoritative.len() != persisted.len() {
            return false;
        }
        match self {
            MatchStrategy::Cardinality => true,
            MatchStrategy::IdSet => {
                let expected: HashSet<&str> = authoritative.iter().map(|e| e.id()).collect();
                let actual: HashSet<&str> = persisted.iter().map(|e| e.id()).collect();
                expected == actual
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Authoritative,
    Persisted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub effective: Vec<T>,
    pub origin: Origin,
}

impl<T> Reconciled<T> {
    /// An authoritative win replaces whatever override was stored.
    pub fn needs_write_back(&self) -> bool {
        self.origin == Origin::Authoritative
    }
}

/// Choose the effective collection for one kind.
pub fn reconcile_collection<T: LocatedEntity>(
    authoritative: Vec<T>,
    persisted: Option<Vec<T>>,
    strategy: MatchStrategy,
) -> Reconciled<T> {
    match persisted {
        Some(persisted) if strategy.is_compatible(&authoritative, &persisted) => Reconciled {
            effective: persisted,
            origin: Origin::Persisted,
        },
        Some(persisted) => {
            info!(
                "Authoritative {} data changed shape ({} persisted, {} fetched), discarding override",
                T::KIND,
                persisted.len(),
                authoritative.len()
            );
            Reconciled {
                effective: authoritative,
                origin: Origin::Authoritative,
            }
        }
        None => Reconciled {
            effective: authoritative,
            origin: Origin::Authoritative,
        },
    }
}

/// Outcome of one installed reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cds: Origin,
    pub delivery_points: Origin,
    pub write_backs: usize,
    pub write_back_failed: bool,
    pub dangling_assignments: Vec<String>,
    pub dangling_connections: usize,
}

pub struct ReconciliationEngine {
    source: Arc<dyn DataSource>,
    strategy: MatchStrategy,
    fetch_timeout: Duration,
}

impl ReconciliationEngine {
    pub fn new(source: Arc<dyn DataSource>, strategy: MatchStrategy, fetch_timeout: Duration) -> Self {
        Self {
            source,
            strategy,
            fetch_timeout,
        }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub async fn fetch(&self) -> FetchResult<Snapshot> {
        fetch_snapshot(self.source.as_ref(), self.fetch_timeout).await
    }

    /// A fetch that owns its inputs, for polling alongside pointer events.
    pub fn fetch_task(&self) -> SnapshotFuture {
        owned_fetch(Arc::clone(&self.source), self.fetch_timeout)
    }

    /// Fetch, reconcile and install. On fetch failure the store keeps its
    /// previous data and moves to the error state.
    pub async fn run_cycle(
        &self,
        persistence: &mut PersistenceAdapter,
        store: &mut EntityStore,
    ) -> FetchResult<CycleReport> {
        store.mark_loading();
        match self.fetch().await {
            Ok(snapshot) => Ok(self.install(snapshot, persistence, store)),
            Err(e) => {
                error!("Failed to load dashboard data: {}", e);
                store.mark_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Reconcile a fetched snapshot against persisted overrides and replace
    /// the store contents.
    pub fn install(
        &self,
        snapshot: Snapshot,
        persistence: &mut PersistenceAdapter,
        store: &mut EntityStore,
    ) -> CycleReport {
        let Snapshot {
            cds,
            delivery_points,
            connections,
        } = snapshot;

        let mut write_backs = 0;
        let mut write_back_failed = false;

        let cds = reconcile_collection(cds, persistence.load(), self.strategy);
        if cds.needs_write_back() {
            write_backs += 1;
            write_back_failed |= !persistence.save(&cds.effective);
        }

        let delivery_points =
            reconcile_collection(delivery_points, persistence.load(), self.strategy);
        if delivery_points.needs_write_back() {
            write_backs += 1;
            write_back_failed |= !persistence.save(&delivery_points.effective);
        }

        if write_back_failed {
            warn!("Authoritative layout could not be written to local storage");
            store.set_storage_warning(Some(
                "Layout could not be saved locally; changes will not survive a reload".to_string(),
            ));
        } else if write_backs > 0 {
            store.set_storage_warning(None);
        }

        let (cd_origin, dp_origin) = (cds.origin, delivery_points.origin);
        store.replace_all(cds.effective, delivery_points.effective, connections);

        let routes = RouteSet::build(store);
        debug!(
            "Installed cycle: cds from {:?}, delivery points from {:?}, {} write-backs",
            cd_origin, dp_origin, write_backs
        );

        CycleReport {
            cds: cd_origin,
            delivery_points: dp_origin,
            write_backs,
            write_back_failed,
            dangling_assignments: routes.dangling_assignments,
            dangling_connections: routes.dangling_connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityStatus, DistributionCenter, Point};

    fn cd(id: &str, x: f64) -> DistributionCenter {
        DistributionCenter {
            id: id.to_string(),
            name: format!("CD {}", id),
            location: Point::new(x, 100.0),
            status: ActivityStatus::Active,
            capacity: 500,
            current_load: 250,
        }
    }

    #[test]
    fn test_no_override_uses_authoritative() {
        let result = reconcile_collection(vec![cd("cd1", 10.0)], None, MatchStrategy::Cardinality);
        assert_eq!(result.origin, Origin::Authoritative);
        assert!(result.needs_write_back());
    }

    #[test]
    fn test_equal_cardinality_override_wins_verbatim() {
        let mut moved = cd("cd1", 400.0);
        moved.name = "Renamed locally".to_string();
        let result = reconcile_collection(
            vec![cd("cd1", 10.0)],
            Some(vec![moved.clone()]),
            MatchStrategy::Cardinality,
        );
        assert_eq!(result.origin, Origin::Persisted);
        assert_eq!(result.effective, vec![moved]);
        assert!(!result.needs_write_back());
    }

    #[test]
    fn test_cardinality_mismatch_discards_override() {
        let authoritative = vec![cd("cd1", 10.0), cd("cd2", 20.0)];
        let result = reconcile_collection(
            authoritative.clone(),
            Some(vec![cd("cd1", 400.0)]),
            MatchStrategy::Cardinality,
        );
        assert_eq!(result.origin, Origin::Authoritative);
        assert_eq!(result.effective, authoritative);
    }

    #[test]
    fn test_cardinality_accepts_swapped_ids() {
        // One removed and one added nets zero length change
        let result = reconcile_collection(
            vec![cd("cd1", 10.0), cd("cd3", 30.0)],
            Some(vec![cd("cd1", 11.0), cd("cd2", 21.0)]),
            MatchStrategy::Cardinality,
        );
        assert_eq!(result.origin, Origin::Persisted);
    }

    #[test]
    fn test_id_set_rejects_swapped_ids() {
        let result = reconcile_collection(
            vec![cd("cd1", 10.0), cd("cd3", 30.0)],
            Some(vec![cd("cd1", 11.0), cd("cd2", 21.0)]),
            MatchStrategy::IdSet,
        );
        assert_eq!(result.origin, Origin::Authoritative);

        let result = reconcile_collection(
            vec![cd("cd1", 10.0), cd("cd2", 30.0)],
            Some(vec![cd("cd2", 21.0), cd("cd1", 11.0)]),
            MatchStrategy::IdSet,
        );
        assert_eq!(result.origin, Origin::Persisted);
    }
}
