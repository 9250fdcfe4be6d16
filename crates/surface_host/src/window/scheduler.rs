//! Frame scheduler
//!
//! Coalesces repaint and relayout requests for one surface into at most one
//! pending commit task. The task reads the flags and viewport when it runs,
//! not when it was posted.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use super::tasks::{CommitExecutor, CommitTarget, CommitTask};
use crate::geometry::{Rect, Size};

/// Per-surface commit counters, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Commits that painted.
    pub commits: u64,
    /// Commits that also ran layout.
    pub layouts: u64,
    /// Tasks that ran but had nothing to do.
    pub skipped: u64,
}

/// What one commit has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitPlan {
    pub layout: bool,
    pub viewport: Size,
    pub damage: Rect,
}

pub struct FrameScheduler {
    executor: Rc<dyn CommitExecutor>,
    needs_commit: Cell<bool>,
    needs_layout: Cell<bool>,
    in_flight: Cell<u8>,
    /// Tickets from older generations are stale.
    generation: Cell<u64>,
    viewport: Cell<Size>,
    damage: Cell<Option<Rect>>,
    full_damage: Cell<bool>,
    stats: Cell<CommitStats>,
}

impl FrameScheduler {
    pub fn new(executor: Rc<dyn CommitExecutor>, viewport: Size) -> Self {
        Self {
            executor,
            needs_commit: Cell::new(false),
            needs_layout: Cell::new(false),
            in_flight: Cell::new(0),
            generation: Cell::new(0),
            viewport: Cell::new(viewport),
            damage: Cell::new(None),
            full_damage: Cell::new(false),
            stats: Cell::new(CommitStats::default()),
        }
    }

    pub fn needs_commit(&self) -> bool {
        self.needs_commit.get()
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout.get()
    }

    pub fn in_flight(&self) -> u8 {
        self.in_flight.get()
    }

    pub fn viewport(&self) -> Size {
        self.viewport.get()
    }

    pub fn stats(&self) -> CommitStats {
        self.stats.get()
    }

    /// Mark the whole viewport dirty and make sure a commit is pending.
    pub fn request_commit(&self, needs_layout: bool, target: &Weak<dyn CommitTarget>) {
        self.full_damage.set(true);
        self.schedule(needs_layout, target);
    }

    /// Mark `rect` dirty and make sure a commit is pending.
    pub fn invalidate_rect(&self, rect: Rect, target: &Weak<dyn CommitTarget>) {
        let damage = match self.damage.get() {
            Some(existing) => existing.union(&rect),
            None => rect,
        };
        self.damage.set(Some(damage));
        self.schedule(false, target);
    }

    /// New viewport. Always relayouts; the engine itself is told by the
    /// surface, synchronously.
    pub fn on_resize(&self, size: Size, target: &Weak<dyn CommitTarget>) {
        self.viewport.set(size);
        self.request_commit(true, target);
    }

    /// Record a viewport without asking for a commit.
    pub fn set_viewport(&self, size: Size) {
        self.viewport.set(size);
    }

    fn schedule(&self, needs_layout: bool, target: &Weak<dyn CommitTarget>) {
        self.needs_commit.set(true);
        if needs_layout {
            self.needs_layout.set(true);
        }
        if self.in_flight.get() > 0 {
            return;
        }
        self.in_flight.set(1);
        self.executor
            .post(CommitTask::new(target.clone(), self.generation.get()));
    }

    /// Called by the commit task. Consumes the coalesced flags and returns
    /// what to do, or `None` when there is nothing to do.
    pub fn begin_commit(&self, ticket: u64) -> Option<CommitPlan> {
        if ticket != self.generation.get() {
            tracing::trace!("Ignoring stale commit ticket {}", ticket);
            return None;
        }
        self.in_flight.set(0);

        if !self.needs_commit.get() {
            self.bump(|stats| stats.skipped += 1);
            return None;
        }

        let viewport = self.viewport.get();
        if viewport.is_empty() {
            // Flags stay set until a usable size arrives
            tracing::trace!("Deferring commit for degenerate viewport {:?}", viewport);
            self.bump(|stats| stats.skipped += 1);
            return None;
        }

        self.needs_commit.set(false);
        let layout = self.needs_layout.replace(false);
        let full = Rect::from_size(viewport);
        let partial = self.damage.take();
        let damage = if layout || self.full_damage.replace(false) {
            full
        } else {
            partial.and_then(|rect| rect.intersection(&full)).unwrap_or(full)
        };

        self.bump(|stats| {
            stats.commits += 1;
            if layout {
                stats.layouts += 1;
            }
        });

        Some(CommitPlan {
            layout,
            viewport,
            damage,
        })
    }

    /// Drop any pending work. Tasks already posted become stale.
    pub fn cancel(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        self.in_flight.set(0);
        self.needs_commit.set(false);
        self.needs_layout.set(false);
        self.damage.set(None);
        self.full_damage.set(false);
    }

    fn bump(&self, update: impl FnOnce(&mut CommitStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}
