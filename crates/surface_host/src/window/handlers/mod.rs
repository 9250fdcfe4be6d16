//! Application lifecycle and event handling
//!
//! Handlers for winit callbacks, kept out of `app.rs`.

pub mod events;
pub mod lifecycle;

pub use events::dispatch_window_event;
pub use lifecycle::{handle_about_to_wait, handle_resumed};
