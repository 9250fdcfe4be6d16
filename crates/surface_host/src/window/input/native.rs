//! Native window-system messages.
//!
//! Platform back-ends translate whatever their windowing system delivers
//! into one of these variants. Controllers match them exhaustively, so a new
//! kind of message is a compile error everywhere it has to be handled.

use super::event::{ButtonMask, MouseButton};
use crate::geometry::{Point, Size};
use crate::platform::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAxis {
    Vertical,
    Horizontal,
}

/// One native message for one window.
///
/// Positions are client-relative, `global` positions are in screen space.
/// Button masks describe the buttons held when the message was generated.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeInput {
    PointerDown {
        button: MouseButton,
        position: Point,
        global: Point,
        buttons: ButtonMask,
    },
    PointerUp {
        button: MouseButton,
        position: Point,
        global: Point,
        buttons: ButtonMask,
    },
    PointerMove {
        position: Point,
        global: Point,
        buttons: ButtonMask,
    },
    /// The platform believes the pointer left the window.
    PointerLeave,
    /// `delta` is in platform wheel units (120 per notch).
    Wheel {
        delta: i32,
        axis: WheelAxis,
        position: Point,
        global: Point,
    },
    KeyDown {
        code: u32,
        repeat: bool,
    },
    KeyUp {
        code: u32,
    },
    Char {
        ch: char,
        repeat: bool,
    },
    FocusGained,
    FocusLost,
    /// Pointer capture was taken by another window.
    CaptureLost,
    Timer(TimerId),
    Resized(Size),
    CloseRequested,
}

impl NativeInput {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            NativeInput::PointerDown { .. } => "pointer-down",
            NativeInput::PointerUp { .. } => "pointer-up",
            NativeInput::PointerMove { .. } => "pointer-move",
            NativeInput::PointerLeave => "pointer-leave",
            NativeInput::Wheel { .. } => "wheel",
            NativeInput::KeyDown { .. } => "key-down",
            NativeInput::KeyUp { .. } => "key-up",
            NativeInput::Char { .. } => "char",
            NativeInput::FocusGained => "focus-gained",
            NativeInput::FocusLost => "focus-lost",
            NativeInput::CaptureLost => "capture-lost",
            NativeInput::Timer(_) => "timer",
            NativeInput::Resized(_) => "resized",
            NativeInput::CloseRequested => "close-requested",
        }
    }

    /// Screen position of a button press, if this is one.
    pub fn button_down_global(&self) -> Option<Point> {
        match self {
            NativeInput::PointerDown { global, .. } => Some(*global),
            _ => None,
        }
    }
}
