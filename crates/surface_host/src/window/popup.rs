//! Popup controller
//!
//! A popup is a transient child surface (dropdown, menu) owned by a parent
//! surface. Its native window is created on a later turn of the message
//! loop than the request that opened it, so a popup opened from inside an
//! input handler never creates windows reentrantly.
//!
//! ```text
//!   Uninitialized ──open──▶ PendingCreate ──timer──▶ Live ◀──▶ Hidden
//!                               │                     │          │
//!                               └─────────────────────┴──────────┴──▶ Closing ──▶ Closed
//! ```
//!
//! Only one popup per UI thread can hold the click-outside hook. Installing
//! it for a new popup dismisses the previous holder.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use host_state::{SurfaceId, SurfaceInfo, WindowHandle};

use super::input::{GestureState, NativeInput};
use super::signals::{SubscriptionId, SurfaceObserver, SurfaceSignal};
use super::surface::{HostServices, Role, SurfaceCore};
use super::state::SurfaceState;
use crate::engine::Engine;
use crate::geometry::{Point, Rect, Size};
use crate::platform::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Uninitialized,
    /// Waiting for the deferred creation timer.
    PendingCreate,
    Live,
    Hidden,
    Closing,
    Closed,
}

impl PopupState {
    pub fn is_closing(self) -> bool {
        matches!(self, PopupState::Closing | PopupState::Closed)
    }
}

/// Per-popup bookkeeping.
#[derive(Debug, Clone)]
struct PopupRecord {
    child: Option<WindowHandle>,
    /// Position relative to the parent's client area.
    offset: Point,
    size: Size,
    visible: bool,
    /// A new rect arrived before the window existed.
    needs_resize: bool,
    initialized: bool,
}

pub struct PopupController {
    id: SurfaceId,
    parent_id: SurfaceId,
    parent_window: WindowHandle,
    parent: Weak<SurfaceCore>,
    services: HostServices,
    state: Cell<PopupState>,
    record: RefCell<PopupRecord>,
    /// Held until the window exists.
    pending_engine: RefCell<Option<Box<dyn Engine>>>,
    core: RefCell<Option<Rc<SurfaceCore>>>,
    subscription: Cell<Option<SubscriptionId>>,
    detached: Cell<bool>,
    me: Weak<PopupController>,
}

impl PopupController {
    pub(crate) fn new(
        services: HostServices,
        parent: &Rc<SurfaceCore>,
        engine: Box<dyn Engine>,
    ) -> Rc<Self> {
        let id = services.context.allocate_surface_id();
        Rc::new_cyclic(|me| Self {
            id,
            parent_id: parent.id(),
            parent_window: parent.window(),
            parent: Rc::downgrade(parent),
            services,
            state: Cell::new(PopupState::Uninitialized),
            record: RefCell::new(PopupRecord {
                child: None,
                offset: Point::default(),
                size: Size::new(1, 1),
                visible: false,
                needs_resize: false,
                initialized: false,
            }),
            pending_engine: RefCell::new(Some(engine)),
            core: RefCell::new(None),
            subscription: Cell::new(None),
            detached: Cell::new(false),
            me: me.clone(),
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn parent_id(&self) -> SurfaceId {
        self.parent_id
    }

    pub fn parent_window(&self) -> WindowHandle {
        self.parent_window
    }

    pub fn state(&self) -> PopupState {
        self.state.get()
    }

    /// The popup's own window, once created.
    pub fn window(&self) -> Option<WindowHandle> {
        self.record.borrow().child
    }

    pub fn is_visible(&self) -> bool {
        self.record.borrow().visible
    }

    /// Rect relative to the parent's client area.
    pub fn content_rect(&self) -> Rect {
        let record = self.record.borrow();
        Rect {
            origin: record.offset,
            size: record.size,
        }
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.core
            .borrow()
            .as_ref()
            .map_or(SurfaceState::Uninitialized, |core| core.state())
    }

    pub fn gesture(&self) -> GestureState {
        self.core
            .borrow()
            .as_ref()
            .map(|core| core.gesture())
            .unwrap_or_default()
    }

    /// Schedule creation of the native window. The window appears when the
    /// parent's creation timer fires.
    pub fn open(&self, rect: Rect, visible: bool) {
        if self.state.get() != PopupState::Uninitialized {
            tracing::debug!("Popup {} already opened", self.id);
            return;
        }
        {
            let mut record = self.record.borrow_mut();
            record.offset = rect.origin;
            record.size = rect.size.clamp_min(1);
            record.visible = visible;
        }
        self.state.set(PopupState::PendingCreate);

        let platform = self.services.platform.clone();
        let registered = self
            .services
            .context
            .ensure_popup_class(|| platform.register_popup_class());
        if let Err(e) = registered {
            tracing::warn!("Popup {} cannot be created: {}", self.id, e);
            return;
        }

        tracing::debug!("Popup {} pending creation under {}", self.id, self.parent_window);
        platform.start_timer(self.parent_window, TimerId::POPUP_CREATE, Duration::ZERO);
    }

    fn screen_rect(&self, parent: &SurfaceCore) -> Rect {
        let record = self.record.borrow();
        Rect {
            origin: parent.screen_rect().origin.offset(record.offset),
            size: record.size,
        }
    }

    /// The parent's creation timer fired.
    pub(crate) fn on_create_timer(&self) {
        if self.state.get() != PopupState::PendingCreate {
            return;
        }
        let parent = match self.parent.upgrade() {
            Some(parent) if parent.is_live() => parent,
            _ => {
                self.request_close();
                return;
            }
        };

        let rect = self.screen_rect(&parent);
        let platform = self.services.platform.clone();
        let child = match platform.create_child_window(self.parent_window, rect) {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to create window for popup {}: {}", self.id, e);
                return;
            }
        };
        let Some(engine) = self.pending_engine.borrow_mut().take() else {
            platform.destroy_window(child);
            return;
        };

        {
            let mut record = self.record.borrow_mut();
            if std::mem::take(&mut record.needs_resize) {
                tracing::trace!("Popup {} created at a rect set while pending", self.id);
            }
            record.child = Some(child);
            record.initialized = true;
        }

        let core = SurfaceCore::new(
            self.services.clone(),
            self.id,
            child,
            SurfaceInfo::popup(self.parent_id, child),
            Role::Popup(self.me.clone()),
        );
        *self.core.borrow_mut() = Some(core.clone());
        if let Some(registry) = self.services.registry.upgrade() {
            registry.register_popup_window(child, self.id);
        }

        if !core.init(engine) {
            tracing::warn!("Popup {} closed during initialization", self.id);
            return;
        }

        let evicted = self
            .services
            .context
            .pointer_hook
            .install(self.id, std::thread::current().id(), rect);
        if let Some(evicted) = evicted {
            tracing::debug!("Popup {} takes the pointer hook from popup {}", self.id, evicted);
            if let Some(registry) = self.services.registry.upgrade() {
                registry.dismiss_popup(evicted);
            }
        }

        let observer: Weak<dyn SurfaceObserver> = self.me.clone();
        self.subscription.set(Some(parent.signals().subscribe(observer)));

        platform.move_window(child, rect);
        self.state.set(PopupState::Live);
        if self.record.borrow().visible {
            platform.show_window(child, true);
        }
        tracing::debug!("Popup {} live as {} at {:?}", self.id, child, rect);
    }

    /// Move or resize the popup. `rect` is relative to the parent's client area.
    pub fn set_content_rect(&self, rect: Rect) {
        let size = rect.size.clamp_min(1);
        {
            let mut record = self.record.borrow_mut();
            record.offset = rect.origin;
            record.size = size;
        }

        match self.state.get() {
            PopupState::Uninitialized | PopupState::PendingCreate => {
                self.record.borrow_mut().needs_resize = true;
            }
            PopupState::Live | PopupState::Hidden => {
                let (Some(parent), Some(child)) = (self.parent.upgrade(), self.window()) else {
                    return;
                };
                let screen = self.screen_rect(&parent);
                self.services.platform.move_window(child, screen);
                self.services.context.pointer_hook.update_bounds(self.id, screen);
                let core = self.core.borrow().clone();
                if let Some(core) = core {
                    core.request_commit(true);
                }
            }
            PopupState::Closing | PopupState::Closed => {}
        }
    }

    pub fn show(&self) {
        match self.state.get() {
            PopupState::Uninitialized | PopupState::PendingCreate => {
                self.record.borrow_mut().visible = true;
            }
            PopupState::Live | PopupState::Hidden => {
                if self.is_visible() && self.state.get() == PopupState::Live {
                    return;
                }
                self.record.borrow_mut().visible = true;
                self.state.set(PopupState::Live);
                if let Some(child) = self.window() {
                    self.services.platform.show_window(child, true);
                }
            }
            PopupState::Closing | PopupState::Closed => {}
        }
    }

    pub fn hide(&self) {
        match self.state.get() {
            PopupState::Uninitialized | PopupState::PendingCreate => {
                self.record.borrow_mut().visible = false;
            }
            PopupState::Live => {
                self.record.borrow_mut().visible = false;
                self.state.set(PopupState::Hidden);
                if let Some(child) = self.window() {
                    self.services.platform.show_window(child, false);
                }
                let core = self.core.borrow().clone();
                if let Some(core) = core {
                    core.on_hidden();
                }
            }
            PopupState::Hidden | PopupState::Closing | PopupState::Closed => {}
        }
    }

    pub(crate) fn handle(&self, input: NativeInput) {
        let core = self.core.borrow().clone();
        match core {
            Some(core) => core.handle(input),
            None => tracing::trace!(
                "Popup {} has no window yet, dropping {}",
                self.id,
                input.name()
            ),
        }
    }

    /// Close the popup. Idempotent.
    pub fn request_close(&self) {
        if self.state.get().is_closing() {
            return;
        }
        tracing::debug!("Closing popup {}", self.id);
        self.state.set(PopupState::Closing);
        self.detach_from_parent();

        if let Some(child) = self.window() {
            self.services.platform.show_window(child, false);
        }

        let core = self.core.borrow().clone();
        match core {
            Some(core) => core.close(),
            None => {
                self.pending_engine.borrow_mut().take();
                self.finish_close();
            }
        }
    }

    /// Cut every tie to the parent and the hook. Runs once.
    fn detach_from_parent(&self) {
        if self.detached.replace(true) {
            return;
        }
        if let Some(parent) = self.parent.upgrade() {
            parent.clear_popup(self.id);
            if let Some(subscription) = self.subscription.take() {
                parent.signals().unsubscribe(subscription);
            }
        }
        self.services.context.pointer_hook.uninstall(self.id);
        if self.state.get() == PopupState::Closing && !self.record.borrow().initialized {
            self.services
                .platform
                .stop_timer(self.parent_window, TimerId::POPUP_CREATE);
        }
    }

    /// The popup's surface finished tearing down.
    pub(crate) fn on_core_finalized(&self) {
        self.detach_from_parent();
        self.finish_close();
    }

    fn finish_close(&self) {
        self.state.set(PopupState::Closed);
        self.core.borrow_mut().take();
        if let Some(registry) = self.services.registry.upgrade() {
            registry.remove_popup(self.id);
        }
        tracing::debug!("Popup {} closed", self.id);
    }
}

impl SurfaceObserver for PopupController {
    fn on_surface_signal(&self, source: SurfaceId, signal: SurfaceSignal) {
        tracing::trace!("Popup {} saw {:?} from parent {}", self.id, signal, source);
        self.request_close();
    }
}
