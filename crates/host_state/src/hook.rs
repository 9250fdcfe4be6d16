//! "Click outside" pointer hook slot.
//!
//! A popup installs the hook while it is live. Any button-down observed on
//! the hook's thread that lands outside the popup's screen bounds asks the
//! owner to dismiss itself. There is a single slot per process: installing a
//! new hook evicts the previous owner, which must then close.

use std::thread::ThreadId;

use parking_lot::Mutex;

use crate::context::SurfaceId;
use crate::geometry::{Point, Rect};

/// A live hook installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookInstallation {
    pub owner: SurfaceId,
    /// Only presses on this thread are observed.
    pub thread: ThreadId,
    /// Screen-space bounds of the owning popup.
    pub bounds: Rect,
}

#[derive(Default)]
pub struct PointerHookSlot {
    installed: Mutex<Option<HookInstallation>>,
}

impl PointerHookSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the hook for `owner`, replacing any existing installation.
    ///
    /// Returns the evicted owner when a different popup held the hook.
    pub fn install(&self, owner: SurfaceId, thread: ThreadId, bounds: Rect) -> Option<SurfaceId> {
        let mut slot = self.installed.lock();
        let previous = slot.replace(HookInstallation { owner, thread, bounds });
        let evicted = previous.map(|p| p.owner).filter(|prev| *prev != owner);
        if let Some(evicted) = evicted {
            tracing::debug!("Pointer hook moved from surface {} to {}", evicted, owner);
        }
        evicted
    }

    /// Remove the hook if `owner` holds it.
    pub fn uninstall(&self, owner: SurfaceId) -> bool {
        let mut slot = self.installed.lock();
        match *slot {
            Some(installation) if installation.owner == owner => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Track the owner's window as it moves or resizes.
    pub fn update_bounds(&self, owner: SurfaceId, bounds: Rect) {
        if let Some(installation) = self.installed.lock().as_mut() {
            if installation.owner == owner {
                installation.bounds = bounds;
            }
        }
    }

    pub fn owner(&self) -> Option<SurfaceId> {
        self.installed.lock().map(|i| i.owner)
    }

    pub fn installation(&self) -> Option<HookInstallation> {
        *self.installed.lock()
    }

    /// Decide whether a button-down at `screen_point` on `thread` dismisses
    /// the hook owner. Returns the owner to dismiss.
    pub fn should_dismiss(&self, thread: ThreadId, screen_point: Point) -> Option<SurfaceId> {
        let installation = (*self.installed.lock())?;
        if installation.thread != thread {
            return None;
        }
        if installation.bounds.contains(screen_point) {
            return None;
        }
        Some(installation.owner)
    }
}
