//! winit + softbuffer platform
//!
//! Real windows for the binary. Windows are presented with softbuffer from
//! the engine's ARGB frame.
//!
//! winit only creates windows from inside an event loop callback, so popup
//! windows requested through [`Platform::create_child_window`] get their
//! handle immediately and are realized on the next `about_to_wait`. Until
//! then geometry and visibility requests are recorded and applied on
//! realization.
//!
//! winit has no explicit pointer capture; the OS captures implicitly while a
//! button is held. Capture ownership is tracked here so the host's capture
//! bookkeeping stays consistent.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use softbuffer::{Context, Surface};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::{CursorIcon, Window as WinitWindow, WindowId, WindowLevel};

use super::{CursorKind, Platform, PlatformError, TimerId, WheelScrollLines};
use crate::engine::Frame;
use crate::geometry::{Point, Rect, Size};
use crate::settings::WindowSettings;
use crate::window::input::{ButtonMask, Modifiers, MouseButton};
use host_state::WindowHandle;

type SoftSurface = Surface<Arc<WinitWindow>, Arc<WinitWindow>>;

const DEFAULT_DOUBLE_CLICK: Duration = Duration::from_millis(500);

struct NativeWindow {
    /// `None` until realized.
    window: Option<Arc<WinitWindow>>,
    surface: Option<SoftSurface>,
    /// Client rect in screen coordinates, as last requested or observed.
    rect: Rect,
    visible: bool,
    popup: bool,
}

struct Timer {
    interval: Duration,
    next: Instant,
}

pub struct WinitPlatform {
    started: Instant,
    next_handle: Cell<u64>,
    windows: RefCell<HashMap<WindowHandle, NativeWindow>>,
    ids: RefCell<HashMap<WindowId, WindowHandle>>,
    timers: RefCell<HashMap<(WindowHandle, TimerId), Timer>>,
    capture: Cell<Option<WindowHandle>>,
    cursor: Cell<Option<Point>>,
    modifiers: Cell<Modifiers>,
    buttons: Cell<ButtonMask>,
    double_click: Duration,
    scroll_lines: WheelScrollLines,
}

impl WinitPlatform {
    pub fn new(double_click: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            next_handle: Cell::new(1),
            windows: RefCell::new(HashMap::new()),
            ids: RefCell::new(HashMap::new()),
            timers: RefCell::new(HashMap::new()),
            capture: Cell::new(None),
            cursor: Cell::new(None),
            modifiers: Cell::new(Modifiers::default()),
            buttons: Cell::new(ButtonMask::NONE),
            double_click: double_click.unwrap_or(DEFAULT_DOUBLE_CLICK),
            scroll_lines: WheelScrollLines::default(),
        }
    }

    fn allocate_handle(&self) -> WindowHandle {
        let handle = WindowHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        handle
    }

    /// Create the main window.
    pub fn create_top_level(
        &self,
        event_loop: &ActiveEventLoop,
        settings: &WindowSettings,
    ) -> Result<WindowHandle, PlatformError> {
        let attributes = WinitWindow::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(PhysicalSize::new(settings.width.max(1), settings.height.max(1)));
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;

        let handle = self.allocate_handle();
        let window = Arc::new(window);
        let surface = create_surface(&window)?;
        let rect = observed_rect(&window, Rect::new(0, 0, settings.width, settings.height));
        self.ids.borrow_mut().insert(window.id(), handle);
        self.windows.borrow_mut().insert(
            handle,
            NativeWindow {
                window: Some(window),
                surface: Some(surface),
                rect,
                visible: true,
                popup: false,
            },
        );
        tracing::debug!("Created top-level {} ({}x{})", handle, settings.width, settings.height);
        Ok(handle)
    }

    /// Create the native windows for popups requested since the last call.
    pub fn realize_pending(&self, event_loop: &ActiveEventLoop) {
        let pending: Vec<(WindowHandle, Rect, bool)> = self
            .windows
            .borrow()
            .iter()
            .filter(|(_, native)| native.window.is_none())
            .map(|(handle, native)| (*handle, native.rect, native.visible))
            .collect();

        for (handle, rect, visible) in pending {
            let attributes = WinitWindow::default_attributes()
                .with_decorations(false)
                .with_resizable(false)
                .with_active(false)
                .with_visible(visible)
                .with_window_level(WindowLevel::AlwaysOnTop)
                .with_position(PhysicalPosition::new(rect.origin.x, rect.origin.y))
                .with_inner_size(PhysicalSize::new(
                    rect.size.width.max(1),
                    rect.size.height.max(1),
                ));

            let window = match event_loop.create_window(attributes) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    tracing::error!("Failed to realize popup {}: {}", handle, e);
                    continue;
                }
            };
            let surface = match create_surface(&window) {
                Ok(surface) => surface,
                Err(e) => {
                    tracing::error!("Failed to create surface for popup {}: {}", handle, e);
                    continue;
                }
            };

            self.ids.borrow_mut().insert(window.id(), handle);
            if let Some(native) = self.windows.borrow_mut().get_mut(&handle) {
                native.window = Some(window);
                native.surface = Some(surface);
            }
            tracing::debug!("Realized popup {} at {:?}", handle, rect);
        }
    }

    pub fn has_pending_windows(&self) -> bool {
        self.windows
            .borrow()
            .values()
            .any(|native| native.window.is_none())
    }

    pub fn handle_for(&self, id: WindowId) -> Option<WindowHandle> {
        self.ids.borrow().get(&id).copied()
    }

    pub fn is_popup(&self, window: WindowHandle) -> bool {
        self.windows
            .borrow()
            .get(&window)
            .is_some_and(|native| native.popup)
    }

    pub fn set_modifiers(&self, modifiers: Modifiers) {
        self.modifiers.set(modifiers);
    }

    pub fn set_cursor_position(&self, position: Option<Point>) {
        self.cursor.set(position);
    }

    pub fn buttons(&self) -> ButtonMask {
        self.buttons.get()
    }

    pub fn press(&self, button: MouseButton) {
        self.buttons.set(self.buttons.get().with(button));
    }

    pub fn release(&self, button: MouseButton) {
        self.buttons.set(self.buttons.get().without(button));
    }

    /// Record a move or resize observed from the window system.
    pub fn observe_geometry(&self, window: WindowHandle) {
        if let Some(native) = self.windows.borrow_mut().get_mut(&window) {
            if let Some(winit_window) = &native.window {
                native.rect = observed_rect(winit_window, native.rect);
            }
        }
    }

    /// Timers due at `now`. Each is rescheduled one interval later.
    pub fn due_timers(&self, now: Instant) -> Vec<(WindowHandle, TimerId)> {
        let mut due = Vec::new();
        for (key, timer) in self.timers.borrow_mut().iter_mut() {
            if timer.next <= now {
                due.push(*key);
                timer.next = now + timer.interval;
            }
        }
        due.sort();
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.borrow().values().map(|timer| timer.next).min()
    }

    fn with_window<R>(&self, window: WindowHandle, f: impl FnOnce(&WinitWindow) -> R) -> Option<R> {
        let windows = self.windows.borrow();
        let native = windows.get(&window)?;
        native.window.as_deref().map(f)
    }
}

fn create_surface(window: &Arc<WinitWindow>) -> Result<SoftSurface, PlatformError> {
    let context = Context::new(window.clone())
        .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
    Surface::new(&context, window.clone()).map_err(|e| PlatformError::WindowCreation(e.to_string()))
}

fn observed_rect(window: &WinitWindow, fallback: Rect) -> Rect {
    let origin = window
        .inner_position()
        .map(|position| Point::new(position.x, position.y))
        .unwrap_or(fallback.origin);
    let size = window.inner_size();
    Rect {
        origin,
        size: Size::new(size.width, size.height),
    }
}

fn cursor_icon(cursor: CursorKind) -> CursorIcon {
    match cursor {
        CursorKind::Default => CursorIcon::Default,
        CursorKind::Pointer => CursorIcon::Pointer,
        CursorKind::Text => CursorIcon::Text,
        CursorKind::Move => CursorIcon::Move,
        CursorKind::Wait => CursorIcon::Wait,
        CursorKind::NotAllowed => CursorIcon::NotAllowed,
        CursorKind::ResizeEw => CursorIcon::EwResize,
        CursorKind::ResizeNs => CursorIcon::NsResize,
    }
}

impl Platform for WinitPlatform {
    fn now(&self) -> Duration {
        self.started.elapsed()
    }

    fn double_click_interval(&self) -> Duration {
        self.double_click
    }

    fn wheel_scroll_lines(&self) -> WheelScrollLines {
        self.scroll_lines
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers.get()
    }

    fn set_capture(&self, window: WindowHandle) {
        self.capture.set(Some(window));
    }

    fn release_capture(&self, window: WindowHandle) {
        if self.capture.get() == Some(window) {
            self.capture.set(None);
        }
    }

    fn has_capture(&self, window: WindowHandle) -> bool {
        self.capture.get() == Some(window)
    }

    fn focus(&self, window: WindowHandle) {
        self.with_window(window, |window| window.focus_window());
    }

    fn has_focus(&self, window: WindowHandle) -> bool {
        self.with_window(window, |window| window.has_focus())
            .unwrap_or(false)
    }

    fn set_cursor(&self, window: WindowHandle, cursor: CursorKind) {
        self.with_window(window, |window| window.set_cursor(cursor_icon(cursor)));
    }

    fn start_timer(&self, window: WindowHandle, timer: TimerId, interval: Duration) {
        self.timers.borrow_mut().insert(
            (window, timer),
            Timer {
                interval,
                next: Instant::now() + interval,
            },
        );
    }

    fn stop_timer(&self, window: WindowHandle, timer: TimerId) {
        self.timers.borrow_mut().remove(&(window, timer));
    }

    fn window_rect(&self, window: WindowHandle) -> Rect {
        let windows = self.windows.borrow();
        match windows.get(&window) {
            Some(native) => match &native.window {
                Some(winit_window) => observed_rect(winit_window, native.rect),
                None => native.rect,
            },
            None => Rect::default(),
        }
    }

    fn is_visible(&self, window: WindowHandle) -> bool {
        let windows = self.windows.borrow();
        let Some(native) = windows.get(&window) else {
            return false;
        };
        native
            .window
            .as_ref()
            .and_then(|window| window.is_visible())
            .unwrap_or(native.visible)
    }

    fn cursor_position(&self) -> Option<Point> {
        self.cursor.get()
    }

    fn register_popup_class(&self) -> Result<(), PlatformError> {
        // winit has no window classes; undecorated windows serve as popups
        Ok(())
    }

    fn create_child_window(
        &self,
        parent: WindowHandle,
        rect: Rect,
    ) -> Result<WindowHandle, PlatformError> {
        if !self.windows.borrow().contains_key(&parent) {
            return Err(PlatformError::UnknownWindow(parent));
        }
        let handle = self.allocate_handle();
        self.windows.borrow_mut().insert(
            handle,
            NativeWindow {
                window: None,
                surface: None,
                rect,
                visible: false,
                popup: true,
            },
        );
        tracing::trace!("Popup window {} requested under {}", handle, parent);
        Ok(handle)
    }

    fn destroy_window(&self, window: WindowHandle) {
        let removed = self.windows.borrow_mut().remove(&window);
        if let Some(native) = removed {
            if let Some(winit_window) = &native.window {
                self.ids.borrow_mut().remove(&winit_window.id());
            }
        }
        self.timers.borrow_mut().retain(|(owner, _), _| *owner != window);
        if self.capture.get() == Some(window) {
            self.capture.set(None);
        }
    }

    fn show_window(&self, window: WindowHandle, visible: bool) {
        if let Some(native) = self.windows.borrow_mut().get_mut(&window) {
            native.visible = visible;
            if let Some(winit_window) = &native.window {
                winit_window.set_visible(visible);
            }
        }
    }

    fn move_window(&self, window: WindowHandle, rect: Rect) {
        if let Some(native) = self.windows.borrow_mut().get_mut(&window) {
            native.rect = rect;
            if let Some(winit_window) = &native.window {
                winit_window
                    .set_outer_position(PhysicalPosition::new(rect.origin.x, rect.origin.y));
                let _ = winit_window.request_inner_size(PhysicalSize::new(
                    rect.size.width.max(1),
                    rect.size.height.max(1),
                ));
            }
        }
    }

    fn begin_system_move(&self, window: WindowHandle) {
        // The move loop swallows the release
        self.release(MouseButton::Left);
        let result = self.with_window(window, |window| window.drag_window());
        if let Some(Err(e)) = result {
            tracing::warn!("System move unavailable for {}: {}", window, e);
        }
    }

    fn present(
        &self,
        window: WindowHandle,
        frame: &Frame,
        damage: Rect,
    ) -> Result<(), PlatformError> {
        let mut windows = self.windows.borrow_mut();
        let native = windows
            .get_mut(&window)
            .ok_or(PlatformError::UnknownWindow(window))?;
        let Some(surface) = native.surface.as_mut() else {
            // Not realized yet; the next commit after realization paints
            return Ok(());
        };

        let size = frame.size();
        let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(());
        };
        surface
            .resize(width, height)
            .map_err(|e| PlatformError::Present(e.to_string()))?;

        let mut buffer = surface
            .buffer_mut()
            .map_err(|e| PlatformError::Present(e.to_string()))?;
        buffer.copy_from_slice(frame.pixels());

        let damage = damage.intersection(&Rect::from_size(size));
        let result = match damage {
            Some(rect) if rect != Rect::from_size(size) => {
                let region = softbuffer::Rect {
                    x: rect.origin.x.max(0) as u32,
                    y: rect.origin.y.max(0) as u32,
                    width: NonZeroU32::new(rect.size.width).unwrap_or(width),
                    height: NonZeroU32::new(rect.size.height).unwrap_or(height),
                };
                buffer.present_with_damage(&[region])
            }
            _ => buffer.present(),
        };
        result.map_err(|e| PlatformError::Present(e.to_string()))
    }
}
