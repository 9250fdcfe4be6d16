//! Surface registry
//!
//! One registry per UI thread. It owns every top-level [`SurfaceController`]
//! and every [`PopupController`] on that thread and routes native messages
//! to them by window handle.
//!
//! ## Routing
//!
//! ```text
//! route(window, input)
//!   ├─ button-down? ──▶ click-outside hook ──▶ dismiss popup (click still delivered)
//!   ├─ top-level window? ──▶ SurfaceController::handle
//!   ├─ popup window? ──▶ PopupController::handle
//!   └─ outermost route done ──▶ flush posted messages (e.g. CaptureLost)
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use std::thread::ThreadId;

use host_state::{HostContext, SurfaceId, WindowHandle};

use super::input::NativeInput;
use super::popup::PopupController;
use super::surface::{HostServices, SurfaceController, SurfaceCore};
use super::tasks::CommitExecutor;
use crate::engine::Engine;
use crate::geometry::{Point, Rect};
use crate::platform::Platform;
use crate::settings::InputSettings;

pub struct SurfaceRegistry {
    platform: Rc<dyn Platform>,
    executor: Rc<dyn CommitExecutor>,
    context: HostContext,
    input: InputSettings,
    thread: ThreadId,
    me: Weak<SurfaceRegistry>,
    top_levels: RefCell<HashMap<WindowHandle, Rc<SurfaceController>>>,
    popups: RefCell<HashMap<SurfaceId, Rc<PopupController>>>,
    popup_windows: RefCell<HashMap<WindowHandle, SurfaceId>>,
    /// Messages posted during routing, delivered after the outermost route.
    pending: RefCell<VecDeque<(SurfaceId, NativeInput)>>,
    depth: Cell<u32>,
}

impl SurfaceRegistry {
    pub fn new(
        platform: Rc<dyn Platform>,
        executor: Rc<dyn CommitExecutor>,
        context: HostContext,
        input: InputSettings,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            platform,
            executor,
            context,
            input,
            thread: std::thread::current().id(),
            me: me.clone(),
            top_levels: RefCell::new(HashMap::new()),
            popups: RefCell::new(HashMap::new()),
            popup_windows: RefCell::new(HashMap::new()),
            pending: RefCell::new(VecDeque::new()),
            depth: Cell::new(0),
        })
    }

    pub(crate) fn services(&self) -> HostServices {
        HostServices {
            platform: self.platform.clone(),
            executor: self.executor.clone(),
            context: self.context.clone(),
            registry: self.me.clone(),
            input: self.input.clone(),
        }
    }

    pub fn context(&self) -> &HostContext {
        &self.context
    }

    /// Bind `engine` to an existing native `window` and bring it live.
    pub fn create_surface(
        &self,
        window: WindowHandle,
        engine: Box<dyn Engine>,
    ) -> Rc<SurfaceController> {
        let controller = Rc::new(SurfaceController::new(self.services(), window));
        self.top_levels.borrow_mut().insert(window, controller.clone());
        tracing::debug!("Surface {} created for {}", controller.id(), window);
        controller.init(engine);
        controller
    }

    pub fn surface(&self, window: WindowHandle) -> Option<Rc<SurfaceController>> {
        self.top_levels.borrow().get(&window).cloned()
    }

    pub fn surface_by_id(&self, id: SurfaceId) -> Option<Rc<SurfaceController>> {
        self.top_levels
            .borrow()
            .values()
            .find(|controller| controller.id() == id)
            .cloned()
    }

    pub fn popup(&self, id: SurfaceId) -> Option<Rc<PopupController>> {
        self.popups.borrow().get(&id).cloned()
    }

    pub fn popup_for_window(&self, window: WindowHandle) -> Option<Rc<PopupController>> {
        let id = self.popup_windows.borrow().get(&window).copied()?;
        self.popup(id)
    }

    pub fn top_level_count(&self) -> usize {
        self.top_levels.borrow().len()
    }

    pub fn popup_count(&self) -> usize {
        self.popups.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.top_level_count() == 0 && self.popup_count() == 0
    }

    /// The window a popup window belongs to.
    pub fn parent_window_of(&self, window: WindowHandle) -> Option<WindowHandle> {
        self.popup_for_window(window).map(|popup| popup.parent_window())
    }

    /// Deliver one native message to the surface that owns `window`.
    pub fn route(&self, window: WindowHandle, input: NativeInput) {
        self.depth.set(self.depth.get() + 1);

        if let Some(global) = input.button_down_global() {
            self.observe_button_down(global);
        }

        if let Some(controller) = self.surface(window) {
            controller.handle(input);
        } else if let Some(popup) = self.popup_for_window(window) {
            popup.handle(input);
        } else {
            tracing::trace!("Dropping {} for unknown {}", input.name(), window);
        }

        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        if depth == 0 {
            self.flush_pending();
        }
    }

    /// Click-outside check. Runs before the press is delivered.
    fn observe_button_down(&self, global: Point) {
        let thread = std::thread::current().id();
        if thread != self.thread {
            return;
        }
        if let Some(owner) = self.context.pointer_hook.should_dismiss(thread, global) {
            tracing::debug!("Press at {:?} outside popup {}, dismissing", global, owner);
            self.dismiss_popup(owner);
        }
    }

    /// Queue `input` for surface `id`, delivered once routing unwinds.
    pub(crate) fn post(&self, id: SurfaceId, input: NativeInput) {
        self.pending.borrow_mut().push_back((id, input));
        if self.depth.get() == 0 {
            self.flush_pending();
        }
    }

    pub fn flush_pending(&self) {
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some((id, input)) = next else {
                break;
            };
            self.depth.set(self.depth.get() + 1);
            if let Some(controller) = self.surface_by_id(id) {
                controller.handle(input);
            } else if let Some(popup) = self.popup(id) {
                popup.handle(input);
            } else {
                tracing::trace!("Dropping posted {} for released surface {}", input.name(), id);
            }
            self.depth.set(self.depth.get().saturating_sub(1));
        }
    }

    pub(crate) fn open_popup(
        &self,
        parent: &Rc<SurfaceCore>,
        engine: Box<dyn Engine>,
        rect: Rect,
        visible: bool,
    ) -> Rc<PopupController> {
        let popup = PopupController::new(self.services(), parent, engine);
        self.popups.borrow_mut().insert(popup.id(), popup.clone());
        popup.open(rect, visible);
        popup
    }

    pub(crate) fn register_popup_window(&self, window: WindowHandle, id: SurfaceId) {
        self.popup_windows.borrow_mut().insert(window, id);
    }

    pub(crate) fn dismiss_popup(&self, id: SurfaceId) {
        if let Some(popup) = self.popup(id) {
            popup.request_close();
        }
    }

    pub(crate) fn remove_popup(&self, id: SurfaceId) {
        let removed = self.popups.borrow_mut().remove(&id);
        if removed.is_some() {
            self.popup_windows.borrow_mut().retain(|_, popup| *popup != id);
        }
    }

    pub(crate) fn remove_top_level(&self, window: WindowHandle) {
        self.top_levels.borrow_mut().remove(&window);
    }

    /// Close every surface on this thread.
    pub fn close_all(&self) {
        let controllers: Vec<_> = self.top_levels.borrow().values().cloned().collect();
        for controller in controllers {
            controller.close();
        }
        let popups: Vec<_> = self.popups.borrow().values().cloned().collect();
        for popup in popups {
            popup.request_close();
        }
    }
}
