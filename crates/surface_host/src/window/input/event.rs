//! Canonical input events delivered to the engine.
//!
//! These are the only input types an [`Engine`](crate::Engine) ever sees.
//! Raw window-system notifications ([`NativeInput`](super::NativeInput)) are
//! normalized into them by the input dispatcher.

use std::time::Duration;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Middle, MouseButton::Right];
}

/// Set of currently held pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ButtonMask(u8);

impl ButtonMask {
    pub const NONE: ButtonMask = ButtonMask(0);
    pub const LEFT: ButtonMask = ButtonMask(1);
    pub const MIDDLE: ButtonMask = ButtonMask(1 << 1);
    pub const RIGHT: ButtonMask = ButtonMask(1 << 2);

    pub fn contains(self, button: MouseButton) -> bool {
        self.0 & ButtonMask::from(button).0 != 0
    }

    pub fn with(self, button: MouseButton) -> Self {
        ButtonMask(self.0 | ButtonMask::from(button).0)
    }

    pub fn without(self, button: MouseButton) -> Self {
        ButtonMask(self.0 & !ButtonMask::from(button).0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<MouseButton> for ButtonMask {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => ButtonMask::LEFT,
            MouseButton::Middle => ButtonMask::MIDDLE,
            MouseButton::Right => ButtonMask::RIGHT,
        }
    }
}

/// Modifier keys and lock states, sampled when an event is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub caps_lock: bool,
    pub num_lock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Up,
    Move,
    Enter,
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Button that changed state. `None` for move, enter and leave.
    pub button: Option<MouseButton>,
    /// Buttons held after this event.
    pub buttons: ButtonMask,
    /// 1 for a single click, 2 for a double click. 0 when not a press/release.
    pub click_count: u8,
    pub position: Point,
    pub global_position: Point,
    pub modifiers: Modifiers,
    pub timestamp: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelGranularity {
    /// Deltas are in pixels.
    Pixel,
    /// Deltas are in pages (the platform is configured to scroll by page).
    Page,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WheelEvent {
    pub delta_x: f32,
    pub delta_y: f32,
    /// Raw notches, before line/pixel scaling.
    pub wheel_ticks_x: f32,
    pub wheel_ticks_y: f32,
    pub granularity: WheelGranularity,
    /// Ctrl+wheel: the engine should zoom rather than scroll.
    pub is_zoom: bool,
    pub position: Point,
    pub global_position: Point,
    pub modifiers: Modifiers,
    pub timestamp: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    RawKeyDown,
    KeyUp,
    Char,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub kind: KeyKind,
    /// Virtual key code (see [`keys`](super::keyboard::keys)). For `Char`
    /// events this is the character's code point.
    pub key_code: u32,
    /// Textual identifier such as `"Up"` or `"U+0041"`.
    pub key_identifier: String,
    /// Produced text for `Char` events.
    pub text: Option<String>,
    pub is_repeat: bool,
    pub modifiers: Modifiers,
    pub timestamp: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Wheel(WheelEvent),
    Key(KeyEvent),
}

impl InputEvent {
    pub fn as_pointer(&self) -> Option<&PointerEvent> {
        match self {
            InputEvent::Pointer(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_wheel(&self) -> Option<&WheelEvent> {
        match self {
            InputEvent::Wheel(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            InputEvent::Key(event) => Some(event),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_mask() {
        let mask = ButtonMask::NONE.with(MouseButton::Left).with(MouseButton::Right);
        assert!(mask.contains(MouseButton::Left));
        assert!(!mask.contains(MouseButton::Middle));
        assert!(mask.contains(MouseButton::Right));

        let mask = mask.without(MouseButton::Left).without(MouseButton::Right);
        assert!(mask.is_empty());
    }
}
