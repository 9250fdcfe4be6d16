//! Input Conversion Utilities
//!
//! Converts winit input types into the host's native input vocabulary.
//!
//! ## Conversion Functions
//! - Mouse button conversion (winit → host)
//! - Keyboard modifier conversion (winit → host)
//! - Physical key code → virtual key code mapping

use winit::event::MouseButton as WinitMouseButton;
use winit::keyboard::{KeyCode, ModifiersState};

use super::event::{Modifiers, MouseButton};
use super::keyboard::keys;

// ============================================================================
// Extension Traits for Type Conversion
// ============================================================================

/// Extension trait for converting winit MouseButton to the host's MouseButton
pub trait ToHostMouseButton {
    /// `None` for buttons the engine has no use for (back/forward/extra).
    fn to_host(self) -> Option<MouseButton>;
}

impl ToHostMouseButton for WinitMouseButton {
    fn to_host(self) -> Option<MouseButton> {
        match self {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            WinitMouseButton::Back | WinitMouseButton::Forward | WinitMouseButton::Other(_) => None,
        }
    }
}

/// Extension trait for converting winit modifiers to host modifiers
pub trait ToHostModifiers {
    fn to_host(&self) -> Modifiers;
}

impl ToHostModifiers for ModifiersState {
    fn to_host(&self) -> Modifiers {
        Modifiers {
            shift: self.shift_key(),
            ctrl: self.control_key(),
            alt: self.alt_key(),
            meta: self.super_key(),
            // winit reports no lock state; the platform tracks lock key toggles
            caps_lock: false,
            num_lock: false,
        }
    }
}

// ============================================================================
// KeyCode to virtual key code
// ============================================================================

/// Map a winit physical key to a virtual key code.
///
/// Returns `None` for keys without a virtual key code.
pub fn keycode_to_vk(code: KeyCode) -> Option<u32> {
    use KeyCode::*;
    let letter = |offset: u32| keys::KEY_A + offset;
    let digit = |offset: u32| keys::DIGIT_0 + offset;
    let function = |offset: u32| keys::F1 + offset;
    Some(match code {
        // Letters
        KeyA => letter(0),
        KeyB => letter(1),
        KeyC => letter(2),
        KeyD => letter(3),
        KeyE => letter(4),
        KeyF => letter(5),
        KeyG => letter(6),
        KeyH => letter(7),
        KeyI => letter(8),
        KeyJ => letter(9),
        KeyK => letter(10),
        KeyL => letter(11),
        KeyM => letter(12),
        KeyN => letter(13),
        KeyO => letter(14),
        KeyP => letter(15),
        KeyQ => letter(16),
        KeyR => letter(17),
        KeyS => letter(18),
        KeyT => letter(19),
        KeyU => letter(20),
        KeyV => letter(21),
        KeyW => letter(22),
        KeyX => letter(23),
        KeyY => letter(24),
        KeyZ => letter(25),

        // Numbers
        Digit0 => digit(0),
        Digit1 => digit(1),
        Digit2 => digit(2),
        Digit3 => digit(3),
        Digit4 => digit(4),
        Digit5 => digit(5),
        Digit6 => digit(6),
        Digit7 => digit(7),
        Digit8 => digit(8),
        Digit9 => digit(9),

        // Special keys
        Space => keys::SPACE,
        Enter | NumpadEnter => keys::ENTER,
        Tab => keys::TAB,
        Backspace => keys::BACKSPACE,
        Escape => keys::ESCAPE,
        Delete => keys::DELETE,
        Insert => keys::INSERT,
        Home => keys::HOME,
        End => keys::END,
        PageUp => keys::PAGE_UP,
        PageDown => keys::PAGE_DOWN,
        ShiftLeft | ShiftRight => keys::SHIFT,
        ControlLeft | ControlRight => keys::CONTROL,
        AltLeft | AltRight => keys::ALT,
        SuperLeft | SuperRight => keys::META,
        CapsLock => keys::CAPS_LOCK,
        NumLock => keys::NUM_LOCK,

        // Arrow keys
        ArrowUp => keys::UP,
        ArrowDown => keys::DOWN,
        ArrowLeft => keys::LEFT,
        ArrowRight => keys::RIGHT,

        // Function keys
        F1 => function(0),
        F2 => function(1),
        F3 => function(2),
        F4 => function(3),
        F5 => function(4),
        F6 => function(5),
        F7 => function(6),
        F8 => function(7),
        F9 => function(8),
        F10 => function(9),
        F11 => function(10),
        F12 => function(11),

        // Punctuation and symbols (OEM codes)
        Semicolon => 0xBA,
        Equal => 0xBB,
        Comma => 0xBC,
        Minus => 0xBD,
        Period => 0xBE,
        Slash => 0xBF,
        Backquote => 0xC0,
        BracketLeft => 0xDB,
        Backslash => 0xDC,
        BracketRight => 0xDD,
        Quote => 0xDE,

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keycode_mapping() {
        assert_eq!(keycode_to_vk(KeyCode::KeyA), Some(0x41));
        assert_eq!(keycode_to_vk(KeyCode::KeyZ), Some(0x5A));
        assert_eq!(keycode_to_vk(KeyCode::Digit9), Some(0x39));
        assert_eq!(keycode_to_vk(KeyCode::F12), Some(0x7B));
        assert_eq!(keycode_to_vk(KeyCode::ArrowUp), Some(keys::UP));
        assert_eq!(keycode_to_vk(KeyCode::NumpadEnter), Some(keys::ENTER));
        assert_eq!(keycode_to_vk(KeyCode::MediaPlayPause), None);
    }

    #[test]
    fn test_mouse_button_mapping() {
        assert_eq!(WinitMouseButton::Left.to_host(), Some(MouseButton::Left));
        assert_eq!(WinitMouseButton::Middle.to_host(), Some(MouseButton::Middle));
        assert_eq!(WinitMouseButton::Back.to_host(), None);
    }

    #[test]
    fn test_modifier_mapping() {
        let modifiers = (ModifiersState::SHIFT | ModifiersState::CONTROL).to_host();
        assert!(modifiers.shift);
        assert!(modifiers.ctrl);
        assert!(!modifiers.alt);
        assert!(!modifiers.meta);
    }
}
