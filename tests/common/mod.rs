#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use routeatlas::dashboard::Dashboard;
use routeatlas::drag::CanvasBounds;
use routeatlas::model::{DeliveryPoint, DistributionCenter, Point};
use routeatlas::errors::{StorageError, StorageResult};
use routeatlas::persistence::{KeyValueStore, MemoryStore, PersistenceAdapter};
use routeatlas::reconcile::{MatchStrategy, ReconciliationEngine};
use routeatlas::scheduler::{Clock, ManualClock, RefreshScheduler};
use routeatlas::source::{InMemorySource, Snapshot};
use serde::de::DeserializeOwned;

pub fn data_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn load_json<T: DeserializeOwned>(name: &str) -> T {
    let bytes = fs::read(data_root().join(name)).expect("sample data file");
    serde_json::from_slice(&bytes).expect("sample data parses")
}

/// The sample network shipped in `data/`.
pub fn sample_snapshot() -> Snapshot {
    Snapshot {
        cds: load_json("cds.json"),
        delivery_points: load_json("delivery-points.json"),
        connections: load_json("cd-connections.json"),
    }
}

pub fn cd_at<'a>(cds: &'a [DistributionCenter], id: &str) -> &'a DistributionCenter {
    cds.iter().find(|cd| cd.id == id).expect("cd present")
}

pub fn dp_at<'a>(points: &'a [DeliveryPoint], id: &str) -> &'a DeliveryPoint {
    points.iter().find(|dp| dp.id == id).expect("delivery point present")
}

pub fn assert_close(actual: Point, expected: Point) {
    assert!(
        (actual.x - expected.x).abs() < 1e-9 && (actual.y - expected.y).abs() < 1e-9,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

/// Local storage that accepts writes but refuses to delete anything.
pub struct StickyStore {
    inner: MemoryStore,
}

impl StickyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

impl KeyValueStore for StickyStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        Err(StorageError::io(
            key,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only slot"),
        ))
    }
}

pub struct Harness {
    pub dashboard: Dashboard,
    pub source: InMemorySource,
    pub storage: MemoryStore,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new(snapshot: Snapshot) -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 7, 23, 21, 0, 0).unwrap());
        Self::with_clock(snapshot, clock.clone(), Arc::new(clock), Duration::from_secs(30))
    }

    /// Like [`Harness::new`], but persisted overrides can never be removed.
    pub fn with_sticky_overrides(snapshot: Snapshot) -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 7, 23, 21, 0, 0).unwrap());
        let storage = MemoryStore::new();
        let persistence = PersistenceAdapter::new(StickyStore::new(storage.clone()));
        Self::build(
            snapshot,
            clock.clone(),
            Arc::new(clock),
            Duration::from_secs(30),
            storage,
            persistence,
        )
    }

    pub fn with_clock(
        snapshot: Snapshot,
        clock: ManualClock,
        scheduler_clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let storage = MemoryStore::new();
        let persistence = PersistenceAdapter::new(storage.clone());
        Self::build(snapshot, clock, scheduler_clock, interval, storage, persistence)
    }

    fn build(
        snapshot: Snapshot,
        clock: ManualClock,
        scheduler_clock: Arc<dyn Clock>,
        interval: Duration,
        storage: MemoryStore,
        persistence: PersistenceAdapter,
    ) -> Self {
        let source = InMemorySource::new(snapshot);
        let engine = ReconciliationEngine::new(
            Arc::new(source.clone()),
            MatchStrategy::Cardinality,
            Duration::from_secs(1),
        );
        let dashboard = Dashboard::new(
            engine,
            persistence,
            RefreshScheduler::new(scheduler_clock, interval),
            CanvasBounds::default(),
        );
        Self {
            dashboard,
            source,
            storage,
            clock,
        }
    }

    /// Move the manual clock past the refresh interval.
    pub fn advance_past_interval(&self) {
        self.clock.advance(chrono::Duration::seconds(31));
    }
}
