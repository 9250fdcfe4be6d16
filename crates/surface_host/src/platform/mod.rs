//! Platform seam
//!
//! Everything the host needs from the native windowing system, behind one
//! trait. Two implementations ship with the crate:
//! - `winit::WinitPlatform` drives real windows through winit + softbuffer
//! - [`crate::testing::FakePlatform`] records calls and runs a manual clock
//!
//! All calls happen on the UI thread that owns the windows.

pub mod winit;

use std::time::Duration;

use thiserror::Error;

use crate::engine::Frame;
use crate::geometry::{Point, Rect};
use crate::window::input::Modifiers;
use host_state::WindowHandle;

/// Identifier of a per-window timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u32);

impl TimerId {
    /// Recurring check for "pointer left the window".
    pub const LEAVE_POLL: TimerId = TimerId(1);
    /// One-shot, zero-delay deferred popup window creation.
    pub const POPUP_CREATE: TimerId = TimerId(2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorKind {
    #[default]
    Default,
    Pointer,
    Text,
    Move,
    Wait,
    NotAllowed,
    ResizeEw,
    ResizeNs,
}

/// Lines scrolled per wheel notch, as configured on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelScrollLines {
    Lines(u32),
    /// The system scrolls one page per notch.
    Page,
}

impl Default for WheelScrollLines {
    fn default() -> Self {
        WheelScrollLines::Lines(3)
    }
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Unknown window: {0}")]
    UnknownWindow(WindowHandle),

    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    #[error("Failed to register window class: {0}")]
    ClassRegistration(String),

    #[error("Failed to present frame: {0}")]
    Present(String),
}

/// The native windowing system, as seen by the host.
pub trait Platform {
    /// Monotonic clock.
    fn now(&self) -> Duration;

    fn double_click_interval(&self) -> Duration;

    fn wheel_scroll_lines(&self) -> WheelScrollLines;

    /// Modifier and lock key state right now.
    fn modifiers(&self) -> Modifiers;

    // ----- capture & focus -----

    fn set_capture(&self, window: WindowHandle);

    fn release_capture(&self, window: WindowHandle);

    fn has_capture(&self, window: WindowHandle) -> bool;

    fn focus(&self, window: WindowHandle);

    fn has_focus(&self, window: WindowHandle) -> bool;

    fn set_cursor(&self, window: WindowHandle, cursor: CursorKind);

    // ----- timers -----

    /// Start (or restart) a timer. A zero interval fires on the next turn of
    /// the message loop. Timers recur until stopped.
    fn start_timer(&self, window: WindowHandle, timer: TimerId, interval: Duration);

    fn stop_timer(&self, window: WindowHandle, timer: TimerId);

    // ----- geometry -----

    /// Client area of `window` in screen coordinates.
    fn window_rect(&self, window: WindowHandle) -> Rect;

    fn is_visible(&self, window: WindowHandle) -> bool;

    /// Pointer position in screen coordinates, if known.
    fn cursor_position(&self) -> Option<Point>;

    // ----- windows -----

    fn register_popup_class(&self) -> Result<(), PlatformError>;

    /// Create a hidden, non-activating popup window owned by `parent` at
    /// `rect` (screen coordinates).
    fn create_child_window(
        &self,
        parent: WindowHandle,
        rect: Rect,
    ) -> Result<WindowHandle, PlatformError>;

    fn destroy_window(&self, window: WindowHandle);

    fn show_window(&self, window: WindowHandle, visible: bool);

    /// Move and resize `window` to `rect` (screen coordinates).
    fn move_window(&self, window: WindowHandle, rect: Rect);

    /// Hand the window to the system's interactive move loop (title-bar drag).
    fn begin_system_move(&self, window: WindowHandle);

    /// Copy the damaged part of `frame` to the screen.
    fn present(&self, window: WindowHandle, frame: &Frame, damage: Rect)
        -> Result<(), PlatformError>;
}
