//! Window-space geometry shared with `host_state`.

pub use host_state::geometry::{Point, Rect, Size};

/// Sentinel position used to move the pointer "off" a surface during teardown.
pub const OFF_SURFACE: Point = Point::new(-10000, -10000);
