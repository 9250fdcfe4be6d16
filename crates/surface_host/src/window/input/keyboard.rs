//! Keyboard event building
//!
//! Key codes are virtual key codes in the common desktop numbering (the
//! same values DOM `keyCode` uses). Non-printable keys get a fixed textual
//! identifier, everything else is `U+XXXX` of its code.

use std::time::Duration;

use super::event::{KeyEvent, KeyKind, Modifiers};

/// Virtual key codes the host cares about.
pub mod keys {
    pub const BACKSPACE: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const ENTER: u32 = 0x0D;
    pub const SHIFT: u32 = 0x10;
    pub const CONTROL: u32 = 0x11;
    pub const ALT: u32 = 0x12;
    pub const CAPS_LOCK: u32 = 0x14;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const PAGE_UP: u32 = 0x21;
    pub const PAGE_DOWN: u32 = 0x22;
    pub const END: u32 = 0x23;
    pub const HOME: u32 = 0x24;
    pub const LEFT: u32 = 0x25;
    pub const UP: u32 = 0x26;
    pub const RIGHT: u32 = 0x27;
    pub const DOWN: u32 = 0x28;
    pub const INSERT: u32 = 0x2D;
    pub const DELETE: u32 = 0x2E;
    pub const DIGIT_0: u32 = 0x30;
    pub const KEY_A: u32 = 0x41;
    pub const META: u32 = 0x5B;
    pub const F1: u32 = 0x70;
    pub const NUM_LOCK: u32 = 0x90;
}

/// Textual identifier for a key code.
pub fn key_identifier(code: u32) -> String {
    let fixed = match code {
        keys::UP => "Up",
        keys::DOWN => "Down",
        keys::LEFT => "Left",
        keys::RIGHT => "Right",
        keys::HOME => "Home",
        keys::END => "End",
        keys::PAGE_UP => "PageUp",
        keys::PAGE_DOWN => "PageDown",
        keys::ENTER => "Enter",
        keys::TAB => "U+0009",
        keys::BACKSPACE => "U+0008",
        keys::ESCAPE => "U+001B",
        _ => return format!("U+{:04X}", code),
    };
    fixed.to_string()
}

pub fn key_down(code: u32, repeat: bool, modifiers: Modifiers, timestamp: Duration) -> KeyEvent {
    KeyEvent {
        kind: KeyKind::RawKeyDown,
        key_code: code,
        key_identifier: key_identifier(code),
        text: None,
        is_repeat: repeat,
        modifiers,
        timestamp,
    }
}

pub fn key_up(code: u32, modifiers: Modifiers, timestamp: Duration) -> KeyEvent {
    KeyEvent {
        kind: KeyKind::KeyUp,
        key_code: code,
        key_identifier: key_identifier(code),
        text: None,
        is_repeat: false,
        modifiers,
        timestamp,
    }
}

pub fn char_event(ch: char, repeat: bool, modifiers: Modifiers, timestamp: Duration) -> KeyEvent {
    KeyEvent {
        kind: KeyKind::Char,
        key_code: ch as u32,
        key_identifier: key_identifier(ch as u32),
        text: Some(ch.to_string()),
        is_repeat: repeat,
        modifiers,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_identifiers() {
        assert_eq!(key_identifier(keys::UP), "Up");
        assert_eq!(key_identifier(keys::PAGE_DOWN), "PageDown");
        assert_eq!(key_identifier(keys::ENTER), "Enter");
        assert_eq!(key_identifier(keys::TAB), "U+0009");
        assert_eq!(key_identifier(keys::BACKSPACE), "U+0008");
        assert_eq!(key_identifier(keys::ESCAPE), "U+001B");
    }

    #[test]
    fn test_other_keys_use_code_point() {
        assert_eq!(key_identifier(keys::KEY_A), "U+0041");
        assert_eq!(key_identifier(keys::DELETE), "U+002E");
        assert_eq!(key_identifier(0x1F600), "U+1F600");
    }

    #[test]
    fn test_char_carries_text_and_repeat() {
        let event = char_event('é', true, Modifiers::default(), Duration::ZERO);
        assert_eq!(event.kind, KeyKind::Char);
        assert_eq!(event.text.as_deref(), Some("é"));
        assert!(event.is_repeat);
        assert_eq!(event.key_identifier, "U+00E9");
    }
}
