//! Surface controller
//!
//! Binds one engine view, one [`FrameScheduler`] and one [`InputDispatcher`]
//! to one native window. `SurfaceCore` holds the shared machinery used by
//! both top-level surfaces and popups; [`SurfaceController`] is the public
//! face of a top-level surface.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──init──▶ Initialized ──close──▶ Destroying ──▶ Destroyed
//!                                                    │
//!                               (waits for active dispatches to unwind)
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use host_state::{HostContext, SurfaceId, SurfaceInfo, WindowHandle};

use super::guard::{self, DeferredClose};
use super::host::SurfaceHost;
use super::input::{GestureState, InputDispatcher, InputEvent, InputSink, Modifiers, NativeInput};
use super::popup::PopupController;
use super::registry::SurfaceRegistry;
use super::scheduler::{CommitStats, FrameScheduler};
use super::signals::{SignalHub, SurfaceSignal};
use super::state::SurfaceState;
use super::tasks::{CommitExecutor, CommitTarget};
use crate::engine::{Engine, Frame, PaintTarget};
use crate::geometry::{Point, Rect, Size};
use crate::platform::{CursorKind, Platform, TimerId, WheelScrollLines};
use crate::settings::InputSettings;

/// Everything a surface needs from the outside, injected by the registry.
#[derive(Clone)]
pub(crate) struct HostServices {
    pub platform: Rc<dyn Platform>,
    pub executor: Rc<dyn CommitExecutor>,
    pub context: HostContext,
    pub registry: Weak<SurfaceRegistry>,
    pub input: InputSettings,
}

pub(crate) enum Role {
    TopLevel,
    Popup(Weak<PopupController>),
}

pub(crate) struct SurfaceCore {
    id: SurfaceId,
    window: WindowHandle,
    info: SurfaceInfo,
    role: Role,
    services: HostServices,
    state: Cell<SurfaceState>,
    enter_count: Cell<u32>,
    finalized: Cell<bool>,
    engine: RefCell<Option<Box<dyn Engine>>>,
    scheduler: FrameScheduler,
    input: RefCell<InputDispatcher>,
    frame: RefCell<Frame>,
    signals: SignalHub,
    /// The live popup this surface opened, if any. Never owning.
    popup: RefCell<Weak<PopupController>>,
    /// Last known client rect in screen coordinates.
    geometry: Cell<Rect>,
    cursor: Cell<Option<CursorKind>>,
    me: Weak<SurfaceCore>,
    span: tracing::Span,
}

impl SurfaceCore {
    pub fn new(
        services: HostServices,
        id: SurfaceId,
        window: WindowHandle,
        info: SurfaceInfo,
        role: Role,
    ) -> Rc<Self> {
        let geometry = services.platform.window_rect(window);
        Rc::new_cyclic(|me| Self {
            id,
            window,
            info,
            role,
            scheduler: FrameScheduler::new(services.executor.clone(), geometry.size),
            input: RefCell::new(InputDispatcher::new(services.input.clone())),
            services,
            state: Cell::new(SurfaceState::Uninitialized),
            enter_count: Cell::new(0),
            finalized: Cell::new(false),
            engine: RefCell::new(None),
            frame: RefCell::new(Frame::default()),
            signals: SignalHub::new(),
            popup: RefCell::new(Weak::new()),
            geometry: Cell::new(geometry),
            cursor: Cell::new(None),
            me: me.clone(),
            span: tracing::debug_span!("surface", surface_id = id.0),
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn window(&self) -> WindowHandle {
        self.window
    }

    pub fn state(&self) -> SurfaceState {
        self.state.get()
    }

    pub fn is_live(&self) -> bool {
        self.state.get().is_live()
    }

    pub fn signals(&self) -> &SignalHub {
        &self.signals
    }

    pub fn commit_stats(&self) -> CommitStats {
        self.scheduler.stats()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn gesture(&self) -> GestureState {
        self.input
            .try_borrow()
            .map(|input| input.gesture().clone())
            .unwrap_or_default()
    }

    pub fn host(&self) -> SurfaceHost {
        SurfaceHost::new(self.me.clone())
    }

    pub fn popup(&self) -> Option<Rc<PopupController>> {
        self.popup.borrow().upgrade()
    }

    fn commit_target(&self) -> Weak<dyn CommitTarget> {
        self.me.clone()
    }

    /// Client rect in screen coordinates, refreshed from the platform.
    pub fn screen_rect(&self) -> Rect {
        let rect = self.services.platform.window_rect(self.window);
        self.geometry.set(rect);
        rect
    }

    /// Bind `engine` and go live. Does nothing on an already initialized surface.
    pub fn init(&self, engine: Box<dyn Engine>) -> bool {
        let _span = self.span.enter();
        if self.state.get() != SurfaceState::Uninitialized {
            tracing::debug!("Surface {} already initialized", self.id);
            return false;
        }

        let rect = self.screen_rect();
        self.scheduler.set_viewport(rect.size);
        *self.engine.borrow_mut() = Some(engine);
        self.input.borrow_mut().reset();
        self.state.set(SurfaceState::Initialized);
        self.services.context.register_surface(self.id, self.info);
        tracing::debug!(
            "Surface {} initialized on {} ({}x{})",
            self.id,
            self.window,
            rect.size.width,
            rect.size.height
        );

        let host = self.host();
        self.with_engine(|engine| {
            engine.attach(host);
            engine.resize(rect.size);
        });
        self.request_commit(true);
        self.is_live()
    }

    /// Run `f` against the engine inside a reentrancy guard.
    fn with_engine<R>(&self, f: impl FnOnce(&mut dyn Engine) -> R) -> Option<R> {
        let _guard = guard::try_enter(self)?;
        let Ok(mut slot) = self.engine.try_borrow_mut() else {
            tracing::warn!("Rejected reentrant engine call on surface {}", self.id);
            return None;
        };
        let engine = slot.as_deref_mut()?;
        Some(f(engine))
    }

    /// Run `f` with the input dispatcher and an engine-backed sink inside a
    /// reentrancy guard. Returns false when the surface could not be entered.
    fn with_input(&self, f: impl FnOnce(&mut InputDispatcher, &mut EngineSink<'_>)) -> bool {
        let Some(_guard) = guard::try_enter(self) else {
            return false;
        };
        let Ok(mut slot) = self.engine.try_borrow_mut() else {
            tracing::warn!("Rejected reentrant input dispatch on surface {}", self.id);
            return false;
        };
        let Some(engine) = slot.as_deref_mut() else {
            return false;
        };
        let Ok(mut dispatcher) = self.input.try_borrow_mut() else {
            tracing::warn!("Rejected nested input dispatch on surface {}", self.id);
            return false;
        };
        let mut sink = EngineSink { core: self, engine };
        f(&mut dispatcher, &mut sink);
        true
    }

    /// Process one native message.
    pub fn handle(&self, input: NativeInput) {
        let _span = self.span.enter();
        tracing::trace!("Surface {} <- {}", self.id, input.name());

        match input {
            NativeInput::PointerDown {
                button,
                position,
                global,
                ..
            } => {
                self.with_input(|dispatcher, sink| {
                    dispatcher.pointer_down(sink, button, position, global)
                });
            }
            NativeInput::PointerUp {
                button,
                position,
                global,
                ..
            } => {
                self.with_input(|dispatcher, sink| {
                    dispatcher.pointer_up(sink, button, position, global)
                });
            }
            NativeInput::PointerMove {
                position,
                global,
                buttons,
            } => {
                self.with_input(|dispatcher, sink| {
                    dispatcher.pointer_move(sink, position, global, buttons)
                });
            }
            NativeInput::PointerLeave => {
                self.with_input(|dispatcher, sink| dispatcher.pointer_leave(sink));
            }
            NativeInput::Wheel {
                delta,
                axis,
                position,
                global,
            } => {
                self.with_input(|dispatcher, sink| {
                    dispatcher.wheel(sink, delta, axis, position, global)
                });
            }
            NativeInput::KeyDown { code, repeat } => {
                self.with_input(|dispatcher, sink| dispatcher.key_down(sink, code, repeat));
            }
            NativeInput::KeyUp { code } => {
                self.with_input(|dispatcher, sink| dispatcher.key_up(sink, code));
            }
            NativeInput::Char { ch, repeat } => {
                self.with_input(|dispatcher, sink| dispatcher.char_input(sink, ch, repeat));
            }
            NativeInput::FocusGained => {
                self.with_engine(|engine| engine.set_focus(true));
            }
            NativeInput::FocusLost => {
                let entered = self.with_input(|dispatcher, sink| {
                    dispatcher.notify_focus_lost(sink);
                    sink.engine.set_focus(false);
                });
                if entered {
                    self.signals.emit(self.id, SurfaceSignal::FocusLost);
                }
            }
            NativeInput::CaptureLost => {
                let entered =
                    self.with_input(|dispatcher, sink| dispatcher.notify_capture_lost(sink));
                if !entered {
                    return;
                }
                match &self.role {
                    Role::Popup(popup) => {
                        if let Some(popup) = popup.upgrade() {
                            popup.request_close();
                        }
                    }
                    Role::TopLevel => self.signals.emit(self.id, SurfaceSignal::CaptureLost),
                }
            }
            NativeInput::Timer(timer) => self.on_timer(timer),
            NativeInput::Resized(size) => self.resize(size),
            NativeInput::CloseRequested => self.request_close(),
        }
    }

    fn on_timer(&self, timer: TimerId) {
        match timer {
            TimerId::LEAVE_POLL => {
                self.with_input(|dispatcher, sink| dispatcher.leave_poll_tick(sink));
            }
            TimerId::POPUP_CREATE => {
                // One-shot
                self.services.platform.stop_timer(self.window, TimerId::POPUP_CREATE);
                if !self.is_live() {
                    return;
                }
                let popup = self.popup.borrow().upgrade();
                if let Some(popup) = popup {
                    popup.on_create_timer();
                }
            }
            other => tracing::trace!("Ignoring unknown timer {:?} on surface {}", other, self.id),
        }
    }

    /// New client size. Unchanged sizes are ignored; degenerate sizes are
    /// recorded but not shown to the engine.
    pub fn resize(&self, size: Size) {
        if !self.is_live() || size == self.scheduler.viewport() {
            return;
        }

        let rect = self.screen_rect();
        if let Role::Popup(_) = self.role {
            self.services
                .context
                .pointer_hook
                .update_bounds(self.id, Rect { origin: rect.origin, size });
        }

        if size.is_empty() {
            tracing::trace!("Surface {} resized to degenerate {:?}", self.id, size);
            self.scheduler.set_viewport(size);
            return;
        }

        tracing::debug!("Surface {} resized to {}x{}", self.id, size.width, size.height);
        if self.with_engine(|engine| engine.resize(size)).is_none() {
            return;
        }
        if self.is_live() {
            self.scheduler.on_resize(size, &self.commit_target());
        }
    }

    // ----- engine callbacks (through SurfaceHost) -----

    pub fn request_commit(&self, needs_layout: bool) {
        if self.is_live() {
            self.scheduler.request_commit(needs_layout, &self.commit_target());
        }
    }

    pub fn invalidate_rect(&self, rect: Rect) {
        if self.is_live() && !rect.is_empty() {
            self.scheduler.invalidate_rect(rect, &self.commit_target());
        }
    }

    /// `rect` is in screen coordinates for top-level surfaces and relative
    /// to the parent for popups.
    pub fn request_window_rect(&self, rect: Rect) {
        if !self.is_live() {
            return;
        }
        match &self.role {
            Role::TopLevel => {
                self.services.platform.move_window(self.window, rect);
                self.geometry.set(rect);
            }
            Role::Popup(popup) => {
                if let Some(popup) = popup.upgrade() {
                    popup.set_content_rect(rect);
                }
            }
        }
    }

    pub fn set_cursor(&self, cursor: CursorKind) {
        if !self.is_live() || self.cursor.get() == Some(cursor) {
            return;
        }
        self.cursor.set(Some(cursor));
        self.services.platform.set_cursor(self.window, cursor);
    }

    /// Open a popup owned by this surface, closing the current one first.
    pub fn open_popup(
        &self,
        engine: Box<dyn Engine>,
        rect: Rect,
        visible: bool,
    ) -> Option<SurfaceId> {
        if !self.is_live() {
            return None;
        }
        self.close_popup();

        let registry = self.services.registry.upgrade()?;
        let parent = self.me.upgrade()?;
        let popup = registry.open_popup(&parent, engine, rect, visible);
        *self.popup.borrow_mut() = Rc::downgrade(&popup);
        Some(popup.id())
    }

    pub fn close_popup(&self) {
        let popup = self.popup.replace(Weak::new()).upgrade();
        if let Some(popup) = popup {
            popup.request_close();
        }
    }

    /// A popup is going away; forget it if it is ours.
    pub fn clear_popup(&self, id: SurfaceId) {
        let ours = self
            .popup
            .borrow()
            .upgrade()
            .is_some_and(|popup| popup.id() == id);
        if ours {
            *self.popup.borrow_mut() = Weak::new();
        }
    }

    /// Close requested by the window system or the engine. Popups close
    /// through their controller so the parent is told.
    pub fn request_close(&self) {
        if let Role::Popup(popup) = &self.role {
            if let Some(popup) = popup.upgrade() {
                popup.request_close();
                return;
            }
        }
        self.close();
    }

    /// Start teardown. Deferred while a dispatch is on the stack.
    pub fn close(&self) {
        let _span = self.span.enter();
        match self.state.get() {
            SurfaceState::Destroying | SurfaceState::Destroyed => return,
            SurfaceState::Uninitialized => {
                self.finalized.set(true);
                self.state.set(SurfaceState::Destroyed);
                self.engine.borrow_mut().take();
                return;
            }
            SurfaceState::Initialized => {}
        }

        if self.enter_count.get() > 0 {
            tracing::debug!("Close of surface {} requested during dispatch, deferring", self.id);
            self.state.set(SurfaceState::Destroying);
            return;
        }

        self.with_input(|dispatcher, sink| dispatcher.synthesize_release(sink));
        if self.state.get() == SurfaceState::Initialized {
            self.state.set(SurfaceState::Destroying);
        }
        self.finalize_close();
    }

    /// The popup this surface belongs to was hidden.
    pub fn on_hidden(&self) {
        self.with_input(|dispatcher, sink| dispatcher.on_hidden(sink));
    }

    fn take_capture(&self) {
        self.services.platform.set_capture(self.window);
        if let Some(previous) = self.services.context.acquire_capture(self.id) {
            tracing::trace!("Surface {} took capture from {}", self.id, previous);
            if let Some(registry) = self.services.registry.upgrade() {
                registry.post(previous, NativeInput::CaptureLost);
            }
        }
    }

    fn drop_capture(&self) {
        self.services.context.release_capture(self.id);
        self.services.platform.release_capture(self.window);
    }
}

impl DeferredClose for SurfaceCore {
    fn enter_count(&self) -> &Cell<u32> {
        &self.enter_count
    }

    fn lifecycle(&self) -> SurfaceState {
        self.state.get()
    }

    fn finalize_close(&self) {
        if self.finalized.replace(true) {
            return;
        }
        tracing::debug!("Finalizing surface {}", self.id);
        self.state.set(SurfaceState::Destroying);

        let platform = &self.services.platform;
        platform.stop_timer(self.window, TimerId::LEAVE_POLL);
        platform.stop_timer(self.window, TimerId::POPUP_CREATE);
        self.scheduler.cancel();
        let owns_capture = self.services.context.capture_owner() == Some(self.id);
        if owns_capture || platform.has_capture(self.window) {
            self.drop_capture();
        }
        if let Ok(mut input) = self.input.try_borrow_mut() {
            input.reset();
        }

        self.close_popup();

        let engine = self
            .engine
            .try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.take());
        match engine {
            Some(mut engine) => engine.detach(),
            None => tracing::warn!("Surface {} had no engine to detach", self.id),
        }

        self.signals.emit(self.id, SurfaceSignal::Destroyed);
        self.services.context.unregister_surface(self.id);
        platform.destroy_window(self.window);
        self.state.set(SurfaceState::Destroyed);
        tracing::debug!("Surface {} destroyed", self.id);

        match &self.role {
            Role::Popup(popup) => {
                if let Some(popup) = popup.upgrade() {
                    popup.on_core_finalized();
                }
            }
            Role::TopLevel => {
                if let Some(registry) = self.services.registry.upgrade() {
                    registry.remove_top_level(self.window);
                }
            }
        }
    }
}

impl CommitTarget for SurfaceCore {
    fn run_commit(&self, ticket: u64) {
        let Some(_guard) = guard::try_enter(self) else {
            return;
        };
        let _span = tracing::trace_span!(parent: &self.span, "commit").entered();
        let Some(plan) = self.scheduler.begin_commit(ticket) else {
            return;
        };

        {
            let Ok(mut slot) = self.engine.try_borrow_mut() else {
                tracing::warn!("Engine busy on surface {}, re-posting commit", self.id);
                self.scheduler.request_commit(plan.layout, &self.commit_target());
                return;
            };
            let Some(engine) = slot.as_deref_mut() else {
                return;
            };
            if plan.layout {
                engine.begin_frame(self.services.platform.now());
                engine.layout();
            }
            let mut frame = self.frame.borrow_mut();
            frame.resize(plan.viewport);
            engine.paint(&mut PaintTarget::new(&mut frame, plan.damage));
        }

        if !self.is_live() {
            return;
        }
        let frame = self.frame.borrow();
        if let Err(e) = self.services.platform.present(self.window, &frame, plan.damage) {
            tracing::warn!("Failed to present surface {}: {}", self.id, e);
        }
        let stats = self.scheduler.stats();
        tracing::trace!(
            "Commit on surface {}: layout={} damage={:?} (commits={}, layouts={}, skipped={})",
            self.id,
            plan.layout,
            plan.damage,
            stats.commits,
            stats.layouts,
            stats.skipped
        );
    }
}

/// The dispatcher's view of a surface during one dispatch.
pub(crate) struct EngineSink<'a> {
    core: &'a SurfaceCore,
    engine: &'a mut dyn Engine,
}

impl InputSink for EngineSink<'_> {
    fn deliver(&mut self, event: InputEvent) -> bool {
        // The engine may have closed the surface earlier in this dispatch
        if !self.core.is_live() {
            tracing::trace!("Dropping event for closing surface {}", self.core.id);
            return false;
        }
        self.engine.dispatch_input(&event)
    }

    fn hit_test_draggable(&mut self, point: Point) -> bool {
        self.core.is_live() && self.engine.hit_test_draggable(point)
    }

    fn notify_drag_ended(&mut self, point: Point, global: Point) {
        if self.core.is_live() {
            self.engine.notify_drag_ended(point, global);
        }
    }

    fn set_capture(&mut self) {
        self.core.take_capture();
    }

    fn release_capture(&mut self) {
        self.core.drop_capture();
    }

    fn has_capture(&self) -> bool {
        self.core.services.platform.has_capture(self.core.window)
    }

    fn has_focus(&self) -> bool {
        self.core.services.platform.has_focus(self.core.window)
    }

    fn focus(&mut self) {
        self.core.services.platform.focus(self.core.window);
    }

    fn begin_system_move(&mut self) {
        self.core.services.platform.begin_system_move(self.core.window);
    }

    fn start_leave_timer(&mut self, interval: std::time::Duration) {
        self.core
            .services
            .platform
            .start_timer(self.core.window, TimerId::LEAVE_POLL, interval);
    }

    fn stop_leave_timer(&mut self) {
        self.core
            .services
            .platform
            .stop_timer(self.core.window, TimerId::LEAVE_POLL);
    }

    fn pointer_in_bounds(&self) -> bool {
        let platform = &self.core.services.platform;
        match platform.cursor_position() {
            Some(cursor) => platform.window_rect(self.core.window).contains(cursor),
            None => true,
        }
    }

    fn is_visible(&self) -> bool {
        self.core.services.platform.is_visible(self.core.window)
    }

    fn modifiers(&self) -> Modifiers {
        self.core.services.platform.modifiers()
    }

    fn now(&self) -> std::time::Duration {
        self.core.services.platform.now()
    }

    fn double_click_interval(&self) -> std::time::Duration {
        self.core.services.platform.double_click_interval()
    }

    fn wheel_scroll_lines(&self) -> WheelScrollLines {
        self.core.services.platform.wheel_scroll_lines()
    }
}

/// A top-level surface.
pub struct SurfaceController {
    core: Rc<SurfaceCore>,
}

impl SurfaceController {
    pub(crate) fn new(services: HostServices, window: WindowHandle) -> Self {
        let id = services.context.allocate_surface_id();
        let info = SurfaceInfo::top_level(window);
        let core = SurfaceCore::new(services, id, window, info, Role::TopLevel);
        Self { core }
    }

    /// Bind the engine and go live. Idempotent.
    pub fn init(&self, engine: Box<dyn Engine>) -> bool {
        self.core.init(engine)
    }

    pub fn id(&self) -> SurfaceId {
        self.core.id()
    }

    pub fn window(&self) -> WindowHandle {
        self.core.window()
    }

    pub fn state(&self) -> SurfaceState {
        self.core.state()
    }

    /// Feed one native message. Prefer [`SurfaceRegistry::route`], which
    /// also drives the click-outside hook.
    pub fn handle(&self, input: NativeInput) {
        self.core.handle(input);
    }

    pub fn resize(&self, size: Size) {
        self.core.resize(size);
    }

    pub fn close(&self) {
        self.core.close();
    }

    /// The handle the engine was given.
    pub fn host(&self) -> SurfaceHost {
        self.core.host()
    }

    pub fn popup(&self) -> Option<Rc<PopupController>> {
        self.core.popup()
    }

    pub fn commit_stats(&self) -> CommitStats {
        self.core.commit_stats()
    }

    pub fn gesture(&self) -> GestureState {
        self.core.gesture()
    }

    pub fn signals(&self) -> &SignalHub {
        self.core.signals()
    }

    /// Whether a commit is waiting for its task to run.
    pub fn commit_pending(&self) -> bool {
        self.core.scheduler().in_flight() > 0
    }

    pub(crate) fn core(&self) -> &Rc<SurfaceCore> {
        &self.core
    }
}
