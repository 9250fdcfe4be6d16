//! Test doubles
//!
//! [`FakePlatform`] stands in for the window system: a manual clock, a timer
//! table, window records and a log of every call. [`RecordingEngine`] records
//! what the host asked of it and can run scripted callbacks into its
//! [`SurfaceHost`] from inside engine calls. [`Harness`] wires both to a
//! registry and pumps timers and commit tasks the way the event loop does.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use host_state::{HostContext, WindowHandle};

use crate::engine::{Engine, Frame, PaintTarget};
use crate::geometry::{Point, Rect, Size};
use crate::platform::{CursorKind, Platform, PlatformError, TimerId, WheelScrollLines};
use crate::settings::InputSettings;
use crate::window::input::{ButtonMask, InputEvent, Modifiers, MouseButton, NativeInput};
use crate::window::{SurfaceController, SurfaceHost, SurfaceRegistry, TaskQueue};

// ============================================================================
// FakePlatform
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    SetCapture(WindowHandle),
    ReleaseCapture(WindowHandle),
    Focus(WindowHandle),
    SetCursor(WindowHandle, CursorKind),
    StartTimer(WindowHandle, TimerId),
    StopTimer(WindowHandle, TimerId),
    RegisterPopupClass,
    CreateWindow(WindowHandle),
    DestroyWindow(WindowHandle),
    ShowWindow(WindowHandle, bool),
    MoveWindow(WindowHandle, Rect),
    BeginSystemMove(WindowHandle),
    Present(WindowHandle, Rect),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeWindow {
    pub rect: Rect,
    pub visible: bool,
    pub parent: Option<WindowHandle>,
    pub presents: u32,
    pub cursor: Option<CursorKind>,
}

#[derive(Debug, Clone, Copy)]
struct FakeTimer {
    interval: Duration,
    next: Duration,
}

pub struct FakePlatform {
    clock: Cell<Duration>,
    next_handle: Cell<u64>,
    windows: RefCell<BTreeMap<WindowHandle, FakeWindow>>,
    timers: RefCell<BTreeMap<(WindowHandle, TimerId), FakeTimer>>,
    capture: Cell<Option<WindowHandle>>,
    focus: Cell<Option<WindowHandle>>,
    cursor: Cell<Option<Point>>,
    modifiers: Cell<Modifiers>,
    scroll_lines: Cell<WheelScrollLines>,
    double_click: Cell<Duration>,
    fail_child_windows: Cell<bool>,
    fail_class_registration: Cell<bool>,
    calls: RefCell<Vec<PlatformCall>>,
    /// Messages the window system would send back, e.g. `Resized`.
    outbox: RefCell<VecDeque<(WindowHandle, NativeInput)>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            clock: Cell::new(Duration::from_secs(1)),
            next_handle: Cell::new(100),
            windows: RefCell::new(BTreeMap::new()),
            timers: RefCell::new(BTreeMap::new()),
            capture: Cell::new(None),
            focus: Cell::new(None),
            cursor: Cell::new(None),
            modifiers: Cell::new(Modifiers::default()),
            scroll_lines: Cell::new(WheelScrollLines::default()),
            double_click: Cell::new(Duration::from_millis(500)),
            fail_child_windows: Cell::new(false),
            fail_class_registration: Cell::new(false),
            calls: RefCell::new(Vec::new()),
            outbox: RefCell::new(VecDeque::new()),
        }
    }

    fn record(&self, call: PlatformCall) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self) -> WindowHandle {
        let handle = WindowHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        handle
    }

    /// A visible top-level window at `rect` (screen coordinates).
    pub fn add_window(&self, rect: Rect) -> WindowHandle {
        let handle = self.allocate();
        self.windows.borrow_mut().insert(
            handle,
            FakeWindow {
                rect,
                visible: true,
                parent: None,
                presents: 0,
                cursor: None,
            },
        );
        handle
    }

    pub fn advance(&self, by: Duration) {
        self.clock.set(self.clock.get() + by);
    }

    pub fn set_cursor_position(&self, position: Option<Point>) {
        self.cursor.set(position);
    }

    pub fn set_modifiers(&self, modifiers: Modifiers) {
        self.modifiers.set(modifiers);
    }

    pub fn set_wheel_scroll_lines(&self, lines: WheelScrollLines) {
        self.scroll_lines.set(lines);
    }

    pub fn set_double_click_interval(&self, interval: Duration) {
        self.double_click.set(interval);
    }

    pub fn fail_child_windows(&self, fail: bool) {
        self.fail_child_windows.set(fail);
    }

    pub fn fail_class_registration(&self, fail: bool) {
        self.fail_class_registration.set(fail);
    }

    /// Hide or show a window behind the host's back.
    pub fn set_visible(&self, window: WindowHandle, visible: bool) {
        if let Some(record) = self.windows.borrow_mut().get_mut(&window) {
            record.visible = visible;
        }
    }

    pub fn window(&self, window: WindowHandle) -> Option<FakeWindow> {
        self.windows.borrow().get(&window).cloned()
    }

    pub fn is_alive(&self, window: WindowHandle) -> bool {
        self.windows.borrow().contains_key(&window)
    }

    pub fn child_windows(&self, parent: WindowHandle) -> Vec<WindowHandle> {
        self.windows
            .borrow()
            .iter()
            .filter(|(_, record)| record.parent == Some(parent))
            .map(|(handle, _)| *handle)
            .collect()
    }

    pub fn is_timer_active(&self, window: WindowHandle, timer: TimerId) -> bool {
        self.timers.borrow().contains_key(&(window, timer))
    }

    pub fn active_timers(&self, window: WindowHandle) -> Vec<TimerId> {
        self.timers
            .borrow()
            .keys()
            .filter(|(owner, _)| *owner == window)
            .map(|(_, timer)| *timer)
            .collect()
    }

    pub fn capture_window(&self) -> Option<WindowHandle> {
        self.capture.get()
    }

    pub fn focused_window(&self) -> Option<WindowHandle> {
        self.focus.get()
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.borrow().clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&PlatformCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| matches(call)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn presents(&self, window: WindowHandle) -> u32 {
        self.window(window).map_or(0, |record| record.presents)
    }

    /// Timers due at the current clock. Each is rescheduled one interval later.
    pub fn due_timers(&self) -> Vec<(WindowHandle, TimerId)> {
        let now = self.clock.get();
        let mut due = Vec::new();
        for (key, timer) in self.timers.borrow_mut().iter_mut() {
            if timer.next <= now {
                due.push(*key);
                timer.next = now + timer.interval.max(Duration::from_millis(1));
            }
        }
        due
    }

    pub fn take_outbox(&self) -> Vec<(WindowHandle, NativeInput)> {
        self.outbox.borrow_mut().drain(..).collect()
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> Duration {
        self.clock.get()
    }

    fn double_click_interval(&self) -> Duration {
        self.double_click.get()
    }

    fn wheel_scroll_lines(&self) -> WheelScrollLines {
        self.scroll_lines.get()
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers.get()
    }

    fn set_capture(&self, window: WindowHandle) {
        self.record(PlatformCall::SetCapture(window));
        self.capture.set(Some(window));
    }

    fn release_capture(&self, window: WindowHandle) {
        self.record(PlatformCall::ReleaseCapture(window));
        if self.capture.get() == Some(window) {
            self.capture.set(None);
        }
    }

    fn has_capture(&self, window: WindowHandle) -> bool {
        self.capture.get() == Some(window)
    }

    fn focus(&self, window: WindowHandle) {
        self.record(PlatformCall::Focus(window));
        self.focus.set(Some(window));
    }

    fn has_focus(&self, window: WindowHandle) -> bool {
        self.focus.get() == Some(window)
    }

    fn set_cursor(&self, window: WindowHandle, cursor: CursorKind) {
        self.record(PlatformCall::SetCursor(window, cursor));
        if let Some(record) = self.windows.borrow_mut().get_mut(&window) {
            record.cursor = Some(cursor);
        }
    }

    fn start_timer(&self, window: WindowHandle, timer: TimerId, interval: Duration) {
        self.record(PlatformCall::StartTimer(window, timer));
        self.timers.borrow_mut().insert(
            (window, timer),
            FakeTimer {
                interval,
                next: self.clock.get() + interval,
            },
        );
    }

    fn stop_timer(&self, window: WindowHandle, timer: TimerId) {
        if self.timers.borrow_mut().remove(&(window, timer)).is_some() {
            self.record(PlatformCall::StopTimer(window, timer));
        }
    }

    fn window_rect(&self, window: WindowHandle) -> Rect {
        self.windows
            .borrow()
            .get(&window)
            .map(|record| record.rect)
            .unwrap_or_default()
    }

    fn is_visible(&self, window: WindowHandle) -> bool {
        self.windows
            .borrow()
            .get(&window)
            .is_some_and(|record| record.visible)
    }

    fn cursor_position(&self) -> Option<Point> {
        self.cursor.get()
    }

    fn register_popup_class(&self) -> Result<(), PlatformError> {
        self.record(PlatformCall::RegisterPopupClass);
        if self.fail_class_registration.get() {
            return Err(PlatformError::ClassRegistration("injected failure".to_string()));
        }
        Ok(())
    }

    fn create_child_window(
        &self,
        parent: WindowHandle,
        rect: Rect,
    ) -> Result<WindowHandle, PlatformError> {
        if self.fail_child_windows.get() {
            return Err(PlatformError::WindowCreation("injected failure".to_string()));
        }
        if !self.is_alive(parent) {
            return Err(PlatformError::UnknownWindow(parent));
        }
        let handle = self.allocate();
        self.windows.borrow_mut().insert(
            handle,
            FakeWindow {
                rect,
                visible: false,
                parent: Some(parent),
                presents: 0,
                cursor: None,
            },
        );
        self.record(PlatformCall::CreateWindow(handle));
        Ok(handle)
    }

    fn destroy_window(&self, window: WindowHandle) {
        self.record(PlatformCall::DestroyWindow(window));
        self.windows.borrow_mut().remove(&window);
        self.timers.borrow_mut().retain(|(owner, _), _| *owner != window);
        if self.capture.get() == Some(window) {
            self.capture.set(None);
        }
        if self.focus.get() == Some(window) {
            self.focus.set(None);
        }
    }

    fn show_window(&self, window: WindowHandle, visible: bool) {
        self.record(PlatformCall::ShowWindow(window, visible));
        self.set_visible(window, visible);
    }

    fn move_window(&self, window: WindowHandle, rect: Rect) {
        self.record(PlatformCall::MoveWindow(window, rect));
        let resized = {
            let mut windows = self.windows.borrow_mut();
            let Some(record) = windows.get_mut(&window) else {
                return;
            };
            let resized = record.rect.size != rect.size;
            record.rect = rect;
            resized
        };
        if resized {
            self.outbox
                .borrow_mut()
                .push_back((window, NativeInput::Resized(rect.size)));
        }
    }

    fn begin_system_move(&self, window: WindowHandle) {
        self.record(PlatformCall::BeginSystemMove(window));
    }

    fn present(
        &self,
        window: WindowHandle,
        frame: &Frame,
        damage: Rect,
    ) -> Result<(), PlatformError> {
        let mut windows = self.windows.borrow_mut();
        let record = windows
            .get_mut(&window)
            .ok_or(PlatformError::UnknownWindow(window))?;
        if frame.size() != record.rect.size {
            tracing::trace!(
                "Presenting {:?} frame into {:?} window",
                frame.size(),
                record.rect.size
            );
        }
        record.presents += 1;
        drop(windows);
        self.record(PlatformCall::Present(window, damage));
        Ok(())
    }
}

// ============================================================================
// RecordingEngine
// ============================================================================

/// Everything a [`RecordingEngine`] was asked to do.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub attached: u32,
    pub detached: u32,
    pub resizes: Vec<Size>,
    pub frames: u32,
    pub layouts: u32,
    pub paints: u32,
    pub damage: Vec<Rect>,
    pub events: Vec<InputEvent>,
    pub focus: Vec<bool>,
    pub drags_ended: Vec<Point>,
}

impl EngineLog {
    pub fn pointer_events(&self) -> Vec<crate::window::input::PointerEvent> {
        self.events
            .iter()
            .filter_map(|event| event.as_pointer().cloned())
            .collect()
    }
}

pub type SharedLog = Rc<RefCell<EngineLog>>;

type InputScript = Box<dyn FnMut(&SurfaceHost, &InputEvent)>;
type LayoutScript = Box<dyn FnMut(&SurfaceHost)>;

pub struct RecordingEngine {
    log: SharedLog,
    host: Option<SurfaceHost>,
    draggable: Option<Rect>,
    color: u32,
    on_input: Option<InputScript>,
    on_layout: Option<LayoutScript>,
}

impl RecordingEngine {
    pub fn new() -> (Self, SharedLog) {
        let log = SharedLog::default();
        let engine = Self {
            log: log.clone(),
            host: None,
            draggable: None,
            color: 0xFF20_2020,
            on_input: None,
            on_layout: None,
        };
        (engine, log)
    }

    /// Presses inside `rect` (client coordinates) start a system move.
    pub fn with_draggable(mut self, rect: Rect) -> Self {
        self.draggable = Some(rect);
        self
    }

    /// Run `script` after recording each input event.
    pub fn on_input(mut self, script: impl FnMut(&SurfaceHost, &InputEvent) + 'static) -> Self {
        self.on_input = Some(Box::new(script));
        self
    }

    /// Run `script` from inside each layout pass.
    pub fn on_layout(mut self, script: impl FnMut(&SurfaceHost) + 'static) -> Self {
        self.on_layout = Some(Box::new(script));
        self
    }

    pub fn boxed(self) -> Box<dyn Engine> {
        Box::new(self)
    }
}

impl Engine for RecordingEngine {
    fn attach(&mut self, host: SurfaceHost) {
        self.log.borrow_mut().attached += 1;
        self.host = Some(host);
    }

    fn detach(&mut self) {
        self.log.borrow_mut().detached += 1;
        self.host = None;
    }

    fn resize(&mut self, size: Size) {
        self.log.borrow_mut().resizes.push(size);
    }

    fn begin_frame(&mut self, _timestamp: Duration) {
        self.log.borrow_mut().frames += 1;
    }

    fn layout(&mut self) {
        self.log.borrow_mut().layouts += 1;
        if let (Some(script), Some(host)) = (self.on_layout.as_mut(), self.host.as_ref()) {
            script(host);
        }
    }

    fn paint(&mut self, target: &mut PaintTarget<'_>) {
        let damage = target.damage();
        target.frame().fill_rect(damage, self.color);
        let mut log = self.log.borrow_mut();
        log.paints += 1;
        log.damage.push(damage);
    }

    fn dispatch_input(&mut self, event: &InputEvent) -> bool {
        self.log.borrow_mut().events.push(event.clone());
        if let (Some(script), Some(host)) = (self.on_input.as_mut(), self.host.as_ref()) {
            script(host, event);
        }
        true
    }

    fn set_focus(&mut self, focused: bool) {
        self.log.borrow_mut().focus.push(focused);
    }

    fn hit_test_draggable(&mut self, point: Point) -> bool {
        self.draggable.is_some_and(|rect| rect.contains(point))
    }

    fn notify_drag_ended(&mut self, point: Point, _global: Point) {
        self.log.borrow_mut().drags_ended.push(point);
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A registry on a [`FakePlatform`], pumped by hand.
pub struct Harness {
    pub platform: Rc<FakePlatform>,
    pub queue: Rc<TaskQueue>,
    pub registry: Rc<SurfaceRegistry>,
    pub context: HostContext,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(InputSettings::default())
    }

    pub fn with_settings(settings: InputSettings) -> Self {
        let platform = Rc::new(FakePlatform::new());
        let queue = Rc::new(TaskQueue::new());
        let context = HostContext::new();
        let registry =
            SurfaceRegistry::new(platform.clone(), queue.clone(), context.clone(), settings);
        Self {
            platform,
            queue,
            registry,
            context,
        }
    }

    /// A top-level surface in a new window at `rect`.
    pub fn open_surface(&self, rect: Rect, engine: Box<dyn Engine>) -> Rc<SurfaceController> {
        let window = self.platform.add_window(rect);
        self.registry.create_surface(window, engine)
    }

    pub fn route(&self, window: WindowHandle, input: NativeInput) {
        self.registry.route(window, input);
    }

    fn global(&self, window: WindowHandle, position: Point) -> Point {
        self.platform.window_rect(window).origin.offset(position)
    }

    pub fn press(&self, window: WindowHandle, button: MouseButton, position: Point) {
        let global = self.global(window, position);
        self.platform.set_cursor_position(Some(global));
        self.route(
            window,
            NativeInput::PointerDown {
                button,
                position,
                global,
                buttons: ButtonMask::from(button),
            },
        );
    }

    pub fn release(&self, window: WindowHandle, button: MouseButton, position: Point) {
        let global = self.global(window, position);
        self.platform.set_cursor_position(Some(global));
        self.route(
            window,
            NativeInput::PointerUp {
                button,
                position,
                global,
                buttons: ButtonMask::NONE,
            },
        );
    }

    pub fn move_to(&self, window: WindowHandle, position: Point, buttons: ButtonMask) {
        let global = self.global(window, position);
        self.platform.set_cursor_position(Some(global));
        self.route(
            window,
            NativeInput::PointerMove {
                position,
                global,
                buttons,
            },
        );
    }

    pub fn run_commits(&self) -> usize {
        self.queue.run_pending()
    }

    /// Deliver every timer due at the current clock.
    pub fn fire_timers(&self) -> usize {
        let due = self.platform.due_timers();
        let fired = due.len();
        for (window, timer) in due {
            self.route(window, NativeInput::Timer(timer));
        }
        fired
    }

    /// Run timers, window-system replies and commits until nothing is left.
    pub fn pump(&self) {
        for _ in 0..64 {
            let mut work = self.fire_timers();
            for (window, input) in self.platform.take_outbox() {
                self.route(window, input);
                work += 1;
            }
            work += self.run_commits();
            if work == 0 {
                return;
            }
        }
        tracing::warn!("Harness pump did not settle");
    }
}
