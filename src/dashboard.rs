//! Wires the store, persistence, reconciliation and drag handling together on
//! one logical thread.
//!
//! Pointer events and refresh ticks are handled one at a time. A refresh
//! fetch stays in flight while pointer events keep being processed, and its
//! result only installs if no local edit is pending by then.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{DashboardConfig, SourceConfig};
use crate::drag::{CanvasBounds, CommitOutcome, DragController, PointerPosition, SurfaceRect};
use crate::errors::{DashboardError, FetchResult};
use crate::model::EntityKind;
use crate::persistence::{FileStore, PersistenceAdapter};
use crate::reconcile::{CycleReport, ReconciliationEngine};
use crate::scheduler::{Clock, RefreshScheduler, SkipReason, SystemClock};
use crate::source::{DataSource, DirectorySource, Snapshot, SnapshotFuture};
use crate::store::EntityStore;

/// Input from the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        kind: EntityKind,
        id: String,
        pointer: PointerPosition,
        surface: SurfaceRect,
    },
    Move {
        pointer: PointerPosition,
        surface: SurfaceRect,
    },
    Up,
    Leave,
}

pub struct Dashboard {
    store: EntityStore,
    persistence: PersistenceAdapter,
    engine: ReconciliationEngine,
    scheduler: RefreshScheduler,
    drag: DragController,
}

impl Dashboard {
    pub fn new(
        engine: ReconciliationEngine,
        persistence: PersistenceAdapter,
        scheduler: RefreshScheduler,
        bounds: CanvasBounds,
    ) -> Self {
        Self {
            store: EntityStore::new(),
            persistence,
            engine,
            scheduler,
            drag: DragController::new(bounds),
        }
    }

    /// Build a dashboard backed by a file store and the configured source.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let source: Arc<dyn DataSource> = match &config.source {
            SourceConfig::Directory { path, resources } => {
                Arc::new(DirectorySource::new(path.clone(), resources.clone()))
            }
            #[cfg(feature = "http")]
            SourceConfig::Http {
                base_url,
                resources,
            } => Arc::new(crate::source::HttpSource::new(base_url.clone(), resources.clone())),
            #[cfg(not(feature = "http"))]
            SourceConfig::Http { base_url, .. } => {
                return Err(DashboardError::UnsupportedSource(base_url.clone()))
            }
        };

        let persistence = PersistenceAdapter::new(FileStore::open(&config.storage_dir)?);
        let engine =
            ReconciliationEngine::new(source, config.match_strategy, config.fetch_timeout());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let scheduler = RefreshScheduler::new(clock, config.refresh_interval());

        Ok(Self::new(engine, persistence, scheduler, config.canvas))
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn persistence(&self) -> &PersistenceAdapter {
        &self.persistence
    }

    /// Apply one pointer event. Returns the commit when a drag ends.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<CommitOutcome> {
        match event {
            PointerEvent::Down {
                kind,
                id,
                pointer,
                surface,
            } => {
                if self
                    .drag
                    .pointer_down(kind, &id, pointer, &surface, &self.store)
                {
                    self.scheduler.record_edit();
                }
                None
            }
            PointerEvent::Move { pointer, surface } => {
                if self
                    .drag
                    .pointer_move(pointer, &surface, &mut self.store)
                    .is_some()
                {
                    self.scheduler.record_edit();
                }
                None
            }
            PointerEvent::Up | PointerEvent::Leave => {
                let outcome = self
                    .drag
                    .pointer_release(&mut self.store, &mut self.persistence)?;
                self.scheduler.record_commit(outcome.saved);
                Some(outcome)
            }
        }
    }

    /// Start a cycle and hand back its fetch, or `None` if one is already in
    /// flight.
    pub fn begin_refresh(&mut self) -> Option<SnapshotFuture> {
        if !self.scheduler.begin_cycle() {
            debug!("Refresh already in flight, dropping request");
            return None;
        }
        self.store.mark_loading();
        Some(self.engine.fetch_task())
    }

    /// Resolve a cycle started by [`Dashboard::begin_refresh`].
    ///
    /// Returns `Ok(None)` when the snapshot was discarded because a local edit
    /// is pending.
    pub fn complete_refresh(
        &mut self,
        result: FetchResult<Snapshot>,
    ) -> Result<Option<CycleReport>, DashboardError> {
        match result {
            Ok(snapshot) => {
                if !self.scheduler.can_install() {
                    info!("Discarding refreshed data, a local edit is pending");
                    self.scheduler.finish_cycle(false);
                    self.store.mark_ready();
                    return Ok(None);
                }
                let report = self
                    .engine
                    .install(snapshot, &mut self.persistence, &mut self.store);
                self.scheduler.finish_cycle(true);
                Ok(Some(report))
            }
            Err(e) => {
                error!("Failed to load dashboard data: {}", e);
                if e.is_transient() {
                    info!("Keeping previous data, the next refresh will retry");
                } else {
                    warn!("Fetch failure is not transient, retries will fail until the source is fixed");
                }
                self.store.mark_error(e.to_string());
                self.scheduler.finish_cycle(false);
                Err(e.into())
            }
        }
    }

    /// Initial or manual load: a full cycle regardless of timing.
    pub async fn refresh(&mut self) -> Result<Option<CycleReport>, DashboardError> {
        let Some(fetch) = self.begin_refresh() else {
            return Ok(None);
        };
        let result = fetch.await;
        self.complete_refresh(result)
    }

    /// Timer-triggered cycle, subject to the skip rule.
    pub async fn tick(&mut self) -> Result<Option<CycleReport>, DashboardError> {
        if !self.timer_may_refresh() {
            return Ok(None);
        }
        self.refresh().await
    }

    fn timer_may_refresh(&self) -> bool {
        match self.scheduler.skip_reason(self.scheduler.now()) {
            None => true,
            Some(SkipReason::UnsavedEdit) => {
                warn!("Refresh paused until the last moved position is saved");
                false
            }
            Some(reason) => {
                debug!("Skipping refresh: {:?}", reason);
                false
            }
        }
    }

    /// Forget user-adjusted positions and reload authoritative data.
    ///
    /// Fails without refreshing when an override could not be removed, since
    /// the next cycle would pick it up again.
    pub async fn reset_positions(&mut self) -> Result<Option<CycleReport>, DashboardError> {
        if !self.persistence.reset() {
            warn!("Reset left persisted positions behind");
            self.store.set_storage_warning(Some(
                "Saved positions could not be cleared; moved entities will keep their layout"
                    .to_string(),
            ));
            return Err(DashboardError::ResetIncomplete);
        }
        self.scheduler.clear_pending_edit();
        self.refresh().await
    }

    /// Drive the dashboard until `shutdown` resolves.
    ///
    /// Runs the initial load immediately, then a refresh on every interval
    /// tick. Fetch errors are reported through the store status and do not
    /// stop the loop.
    pub async fn run<S>(
        &mut self,
        mut events: mpsc::Receiver<PointerEvent>,
        shutdown: S,
    ) -> Result<(), DashboardError>
    where
        S: Future<Output = ()>,
    {
        let interval = self.scheduler.interval();
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: Option<SnapshotFuture> = self.begin_refresh();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down refresh loop");
                    break;
                }
                _ = ticker.tick() => {
                    if self.timer_may_refresh() {
                        in_flight = self.begin_refresh();
                    }
                }
                result = poll_in_flight(&mut in_flight) => {
                    in_flight = None;
                    // Fetch failures already live in the store status
                    let _ = self.complete_refresh(result);
                }
                Some(event) = events.recv() => {
                    self.handle_pointer(event);
                }
            }
        }

        Ok(())
    }
}

async fn poll_in_flight(slot: &mut Option<SnapshotFuture>) -> FetchResult<Snapshot> {
    match slot {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}
