//! Typed Host Context
//!
//! One `HostContext` is shared by every surface controller on the host. It
//! owns the process-wide singletons an embedded surface needs: the surface
//! registry, pointer capture, the click-outside hook and popup class
//! registration. Clones share the same underlying state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::capture::CaptureSlot;
use crate::hook::PointerHookSlot;
use crate::registration::{ClassRegistration, HostStateError};

/// Opaque native window handle.
///
/// Kept as a plain integer so host state stays decoupled from the windowing
/// system. Platform back-ends map their own window ids to and from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Identifier of one embedded surface. `0` is never allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    TopLevel,
    Popup,
}

/// Registry entry for a live surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub kind: SurfaceKind,
    /// Owning surface for popups.
    pub parent: Option<SurfaceId>,
    pub window: WindowHandle,
}

impl SurfaceInfo {
    pub fn top_level(window: WindowHandle) -> Self {
        Self {
            kind: SurfaceKind::TopLevel,
            parent: None,
            window,
        }
    }

    pub fn popup(parent: SurfaceId, window: WindowHandle) -> Self {
        Self {
            kind: SurfaceKind::Popup,
            parent: Some(parent),
            window,
        }
    }
}

/// Main host context
#[derive(Clone)]
pub struct HostContext {
    /// Live surfaces indexed by id
    pub surfaces: Arc<DashMap<SurfaceId, SurfaceInfo>>,

    /// Which surface holds pointer capture
    pub capture: Arc<CaptureSlot>,

    /// Click-outside hook for the live popup
    pub pointer_hook: Arc<PointerHookSlot>,

    /// Native popup window class
    pub popup_class: Arc<ClassRegistration>,

    next_surface_id: Arc<AtomicU64>,
}

impl HostContext {
    pub fn new() -> Self {
        Self {
            surfaces: Arc::new(DashMap::new()),
            capture: Arc::new(CaptureSlot::new()),
            pointer_hook: Arc::new(PointerHookSlot::new()),
            popup_class: Arc::new(ClassRegistration::new()),
            next_surface_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Hand out a fresh surface id
    pub fn allocate_surface_id(&self) -> SurfaceId {
        SurfaceId(self.next_surface_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a live surface
    pub fn register_surface(&self, id: SurfaceId, info: SurfaceInfo) {
        tracing::trace!("Registering surface {} ({:?}) on {}", id, info.kind, info.window);
        self.surfaces.insert(id, info);
    }

    /// Unregister a surface, dropping any capture or hook it still holds
    pub fn unregister_surface(&self, id: SurfaceId) -> Option<SurfaceInfo> {
        self.capture.release(id);
        self.pointer_hook.uninstall(id);
        self.surfaces.remove(&id).map(|(_, info)| info)
    }

    pub fn surface(&self, id: SurfaceId) -> Option<SurfaceInfo> {
        self.surfaces.get(&id).map(|entry| *entry.value())
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Popups currently registered under `parent`
    pub fn popups_of(&self, parent: SurfaceId) -> Vec<SurfaceId> {
        self.surfaces
            .iter()
            .filter(|entry| entry.value().parent == Some(parent))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Give pointer capture to `id`, returning the surface that lost it
    pub fn acquire_capture(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.capture.acquire(id)
    }

    pub fn release_capture(&self, id: SurfaceId) -> bool {
        self.capture.release(id)
    }

    pub fn capture_owner(&self) -> Option<SurfaceId> {
        self.capture.owner()
    }

    /// Register the popup window class unless already registered
    pub fn ensure_popup_class<E: fmt::Display>(
        &self,
        register: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), HostStateError> {
        self.popup_class.ensure(register)
    }

    /// Set as global instance (for the binary's event loop)
    pub fn set_global(self) {
        GLOBAL_CONTEXT.set(self).ok();
    }

    /// Get global instance
    pub fn global() -> Option<&'static Self> {
        GLOBAL_CONTEXT.get()
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_CONTEXT: OnceLock<HostContext> = OnceLock::new();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_surface_ids_are_unique_and_nonzero() {
        let context = HostContext::new();
        let a = context.allocate_surface_id();
        let b = context.clone().allocate_surface_id();
        assert_ne!(a, b);
        assert_ne!(a.0, 0);
    }

    #[test]
    fn test_register_and_unregister() {
        let context = HostContext::new();
        let parent = context.allocate_surface_id();
        let popup = context.allocate_surface_id();

        context.register_surface(parent, SurfaceInfo::top_level(WindowHandle(1)));
        context.register_surface(popup, SurfaceInfo::popup(parent, WindowHandle(2)));

        assert_eq!(context.surface_count(), 2);
        assert_eq!(context.popups_of(parent), vec![popup]);
        assert_eq!(context.surface(popup).map(|i| i.kind), Some(SurfaceKind::Popup));

        assert!(context.unregister_surface(popup).is_some());
        assert!(context.unregister_surface(popup).is_none());
        assert_eq!(context.surface_count(), 1);
    }

    #[test]
    fn test_unregister_drops_capture_and_hook() {
        let context = HostContext::new();
        let id = context.allocate_surface_id();
        context.register_surface(id, SurfaceInfo::top_level(WindowHandle(9)));

        context.capture.acquire(id);
        context
            .pointer_hook
            .install(id, std::thread::current().id(), Rect::new(0, 0, 5, 5));

        context.unregister_surface(id);
        assert_eq!(context.capture.owner(), None);
        assert_eq!(context.pointer_hook.owner(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let context = HostContext::new();
        let clone = context.clone();
        let id = clone.allocate_surface_id();
        clone.register_surface(id, SurfaceInfo::top_level(WindowHandle(3)));
        assert_eq!(context.surface_count(), 1);
    }
}
