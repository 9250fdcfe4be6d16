//! Wheel delta conversion
//!
//! Platform wheel deltas arrive in units of 120 per notch. The engine wants
//! pixels, or pages when the system is set to scroll a page per notch.

use std::time::Duration;

use super::event::{Modifiers, WheelEvent, WheelGranularity};
use super::native::WheelAxis;
use crate::geometry::Point;
use crate::platform::WheelScrollLines;

pub const WHEEL_DELTA: f32 = 120.0;

pub struct WheelInput {
    pub delta: i32,
    pub axis: WheelAxis,
    pub position: Point,
    pub global: Point,
}

pub fn convert_wheel(
    input: WheelInput,
    scroll_lines: WheelScrollLines,
    pixels_per_line: f32,
    modifiers: Modifiers,
    timestamp: Duration,
) -> WheelEvent {
    let ticks = input.delta as f32 / WHEEL_DELTA;
    let (granularity, delta) = match scroll_lines {
        WheelScrollLines::Page => (WheelGranularity::Page, ticks),
        WheelScrollLines::Lines(lines) => {
            (WheelGranularity::Pixel, ticks * lines as f32 * pixels_per_line)
        }
    };

    // Shift turns vertical wheel motion into horizontal scrolling
    let horizontal = match input.axis {
        WheelAxis::Horizontal => true,
        WheelAxis::Vertical => modifiers.shift,
    };

    let (delta_x, delta_y, wheel_ticks_x, wheel_ticks_y) = if horizontal {
        (delta, 0.0, ticks, 0.0)
    } else {
        (0.0, delta, 0.0, ticks)
    };

    WheelEvent {
        delta_x,
        delta_y,
        wheel_ticks_x,
        wheel_ticks_y,
        granularity,
        is_zoom: modifiers.ctrl,
        position: input.position,
        global_position: input.global,
        modifiers,
        timestamp,
    }
}
