//! Lock-free progress counters for an in-flight run.
//!
//! Workers bump `started` / `finished` with atomic increments; an observer
//! can call [`ProgressTracker::snapshot`] at any time without blocking them.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::domain::CheckId;

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Building the request and the catalog.
    Loading,
    /// Checks are being submitted.
    Running,
    /// All checks submitted; waiting for in-flight checks.
    Draining,
    Finished,
}

impl RunPhase {
    fn as_u8(self) -> u8 {
        match self {
            RunPhase::Loading => 0,
            RunPhase::Running => 1,
            RunPhase::Draining => 2,
            RunPhase::Finished => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RunPhase::Loading,
            1 => RunPhase::Running,
            2 => RunPhase::Draining,
            _ => RunPhase::Finished,
        }
    }
}

/// Handed out by [`ProgressTracker::on_start`], consumed by `on_finish`.
#[derive(Debug)]
#[must_use = "a started check must be finished"]
pub struct StartToken {
    id: CheckId,
    started_at: Instant,
}

impl StartToken {
    pub fn id(&self) -> &CheckId {
        &self.id
    }
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub started: usize,
    pub finished: usize,
    pub phase: RunPhase,
}

impl ProgressSnapshot {
    pub fn in_flight(&self) -> usize {
        self.started.saturating_sub(self.finished)
    }

    /// Every launched check has been joined and finished.
    ///
    /// Tasks bump `started` when they begin, so a `Draining` snapshot can
    /// still be missing queued tasks; only `Finished` is conclusive.
    pub fn is_drained(&self) -> bool {
        self.phase == RunPhase::Finished && self.finished == self.started
    }
}

/// Shared started / finished counters plus the run phase.
#[derive(Debug)]
pub struct ProgressTracker {
    started: AtomicUsize,
    finished: AtomicUsize,
    phase: AtomicU8,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub const fn new() -> Self {
        Self {
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            phase: AtomicU8::new(0),
        }
    }

    /// Record that `id` began executing.
    pub fn on_start(&self, id: &CheckId) -> StartToken {
        let started_at = Instant::now();
        self.started.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(check_id = %id, "progress: started");
        StartToken {
            id: id.clone(),
            started_at,
        }
    }

    /// Record that the check behind `token` completed; returns its duration.
    pub fn on_finish(&self, token: StartToken) -> u64 {
        let duration_ms = token.started_at.elapsed().as_millis() as u64;
        self.finished.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(check_id = %token.id, duration_ms, "progress: finished");
        duration_ms
    }

    pub fn set_phase(&self, phase: RunPhase) {
        self.phase.store(phase.as_u8(), Ordering::Release);
    }

    pub fn phase(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Read the counters without blocking writers.
    ///
    /// `finished` is loaded before `started`, so `finished <= started` holds
    /// in every snapshot even while workers race.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let phase = self.phase();
        let finished = self.finished.load(Ordering::Acquire);
        let started = self.started.load(Ordering::Acquire);
        ProgressSnapshot {
            started,
            finished,
            phase,
        }
    }
}
