//! Refresh cadence and the skip-on-unsynced-edit rule.
//!
//! The scheduler owns every timestamp that decides whether a reconciliation
//! cycle may start or install. Time comes from an injected [`Clock`], so the
//! decision can be tested without real timers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A drag is active
    PendingEdit,
    /// A committed edit did not reach durable storage; refreshes stay paused
    /// until a later commit or reset succeeds
    UnsavedEdit,
    /// The previous cycle has not resolved yet
    CycleInFlight,
    /// A cycle completed less than half an interval ago
    NotDue,
}

pub struct RefreshScheduler {
    clock: Arc<dyn Clock>,
    interval: Duration,
    last_edit_at: Option<DateTime<Utc>>,
    last_sync_at: Option<DateTime<Utc>>,
    pending_edit_since: Option<DateTime<Utc>>,
    commit_failed: bool,
    cycle_started_at: Option<DateTime<Utc>>,
}

impl RefreshScheduler {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            last_edit_at: None,
            last_sync_at: None,
            pending_edit_since: None,
            commit_failed: false,
            cycle_started_at: None,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_edit_at(&self) -> Option<DateTime<Utc>> {
        self.last_edit_at
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    pub fn has_pending_edit(&self) -> bool {
        self.pending_edit_since.is_some()
    }

    /// True when refreshes are paused behind an edit whose save failed.
    pub fn has_unsaved_edit(&self) -> bool {
        self.pending_edit_since.is_some() && self.commit_failed
    }

    pub fn cycle_in_flight(&self) -> bool {
        self.cycle_started_at.is_some()
    }

    /// Decide whether a timer-triggered cycle should be skipped at `now`.
    pub fn skip_reason(&self, now: DateTime<Utc>) -> Option<SkipReason> {
        if self.has_unsaved_edit() {
            return Some(SkipReason::UnsavedEdit);
        }
        if self.pending_edit_since.is_some() {
            return Some(SkipReason::PendingEdit);
        }
        if self.cycle_started_at.is_some() {
            return Some(SkipReason::CycleInFlight);
        }
        if let Some(last_sync) = self.last_sync_at {
            let spacing = chrono::Duration::from_std(self.interval / 2)
                .unwrap_or_else(|_| chrono::Duration::zero());
            if now < last_sync + spacing {
                return Some(SkipReason::NotDue);
            }
        }
        None
    }

    pub fn should_skip_cycle(&self, now: DateTime<Utc>) -> bool {
        self.skip_reason(now).is_some()
    }

    /// A local edit started or progressed. Suppresses refreshes until the
    /// edit is committed.
    pub fn record_edit(&mut self) {
        let now = self.clock.now();
        self.last_edit_at = Some(now);
        self.pending_edit_since.get_or_insert(now);
    }

    /// The edit went through its save path. A failed save keeps the
    /// suppression, since a refresh would restore the stale persisted copy.
    pub fn record_commit(&mut self, saved: bool) {
        self.commit_failed = !saved;
        if saved {
            self.pending_edit_since = None;
        } else {
            debug!("Edit not persisted, keeping refresh suppressed");
        }
    }

    /// Drop any pending edit, used after persisted overrides are reset.
    pub fn clear_pending_edit(&mut self) {
        self.pending_edit_since = None;
        self.commit_failed = false;
    }

    /// Returns false when a cycle is already in flight.
    pub fn begin_cycle(&mut self) -> bool {
        if self.cycle_started_at.is_some() {
            return false;
        }
        self.cycle_started_at = Some(self.clock.now());
        true
    }

    /// A finished fetch may only install if no edit is pending.
    pub fn can_install(&self) -> bool {
        self.pending_edit_since.is_none()
    }

    pub fn finish_cycle(&mut self, installed: bool) {
        let started = self.cycle_started_at.take();
        if installed {
            self.last_sync_at = started.or_else(|| Some(self.clock.now()));
        }
    }
}
