//! The engine's handle back to its surface.
//!
//! An engine receives a [`SurfaceHost`] in [`Engine::attach`] and keeps it
//! for as long as it likes. The handle holds no strong reference; once the
//! surface is gone every call is a no-op.
//!
//! [`Engine::attach`]: crate::engine::Engine::attach

use std::rc::Weak;

use host_state::SurfaceId;

use super::surface::SurfaceCore;
use crate::engine::Engine;
use crate::geometry::Rect;
use crate::platform::CursorKind;

#[derive(Clone)]
pub struct SurfaceHost {
    core: Weak<SurfaceCore>,
}

impl SurfaceHost {
    pub(crate) fn new(core: Weak<SurfaceCore>) -> Self {
        Self { core }
    }

    /// A handle that is not bound to any surface.
    pub fn detached() -> Self {
        Self { core: Weak::new() }
    }

    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.core.upgrade().map(|core| core.id())
    }

    pub fn is_alive(&self) -> bool {
        self.core.upgrade().is_some_and(|core| core.is_live())
    }

    /// Ask for a commit. Any number of calls before the commit runs produce
    /// a single commit.
    pub fn request_commit(&self, needs_layout: bool) {
        if let Some(core) = self.core.upgrade() {
            core.request_commit(needs_layout);
        }
    }

    /// Repaint `rect` (client coordinates) at the next commit.
    pub fn invalidate_rect(&self, rect: Rect) {
        if let Some(core) = self.core.upgrade() {
            core.invalidate_rect(rect);
        }
    }

    /// Move or resize the window. Popups take a rect relative to their parent.
    pub fn request_window_rect(&self, rect: Rect) {
        if let Some(core) = self.core.upgrade() {
            core.request_window_rect(rect);
        }
    }

    pub fn set_cursor(&self, cursor: CursorKind) {
        if let Some(core) = self.core.upgrade() {
            core.set_cursor(cursor);
        }
    }

    /// Open a popup at `rect`, relative to this surface's client area. An
    /// already open popup is closed first. The popup window appears on a
    /// later turn of the event loop.
    pub fn open_popup(
        &self,
        engine: Box<dyn Engine>,
        rect: Rect,
        visible: bool,
    ) -> Option<SurfaceId> {
        self.core.upgrade()?.open_popup(engine, rect, visible)
    }

    pub fn close_popup(&self) {
        if let Some(core) = self.core.upgrade() {
            core.close_popup();
        }
    }

    /// Ask for this surface to close. Safe to call from inside any engine
    /// callback; teardown waits until the callback returns.
    pub fn request_close(&self) {
        if let Some(core) = self.core.upgrade() {
            core.request_close();
        }
    }
}

impl std::fmt::Debug for SurfaceHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHost")
            .field("surface", &self.surface_id())
            .finish()
    }
}
