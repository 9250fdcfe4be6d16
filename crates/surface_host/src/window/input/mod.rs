//! Input handling module
//!
//! Native messages in, canonical engine events out.
//!
//! - `native` - tagged native messages produced by platform back-ends
//! - `event` - canonical events the engine consumes
//! - `dispatcher` - per-surface gesture state machine
//! - `click`, `wheel`, `keyboard` - focused conversion helpers
//! - `conversion` - winit → host type conversion

pub mod click;
pub mod conversion;
pub mod dispatcher;
pub mod event;
pub mod keyboard;
pub mod native;
pub mod wheel;

pub use conversion::{keycode_to_vk, ToHostModifiers, ToHostMouseButton};
pub use dispatcher::{GestureState, InputDispatcher, InputSink};
pub use event::{
    ButtonMask, InputEvent, KeyEvent, KeyKind, Modifiers, MouseButton, PointerEvent, PointerKind,
    WheelEvent, WheelGranularity,
};
pub use keyboard::{key_identifier, keys};
pub use native::{NativeInput, WheelAxis};
