//! Surface Host
//!
//! Hosts a content engine inside native windows. The engine is a black box
//! that lays out and paints a document; this crate decides when it paints,
//! turns raw window-system input into the engine's event vocabulary, and
//! manages transient popup surfaces (dropdowns, menus) that belong to a
//! parent surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            SurfaceRegistry (per UI thread)   │
//! ├──────────────────────────────────────────────┤
//! │  top-level: SurfaceController ─┐             │
//! │  popups:    PopupController ───┤             │
//! └────────────────────────────────┼─────────────┘
//!                                  │
//!              ┌───────────────────┴──────────┐
//!              │ SurfaceCore                  │
//!              │  ├─ FrameScheduler (commits) │
//!              │  ├─ InputDispatcher (input)  │
//!              │  └─ Box<dyn Engine>          │
//!              └──────────────────────────────┘
//! ```
//!
//! Native messages enter through [`SurfaceRegistry::route`] as
//! [`NativeInput`] values. The engine talks back through its
//! [`SurfaceHost`] handle.

pub mod args;
pub mod demo;
pub mod engine;
pub mod geometry;
pub mod logging;
pub mod platform;
pub mod settings;
pub mod testing;
pub mod window;

pub use engine::{Engine, Frame, PaintTarget};
pub use geometry::{Point, Rect, Size};
pub use host_state::{HostContext, SurfaceId, WindowHandle};
pub use platform::{CursorKind, Platform, PlatformError, TimerId, WheelScrollLines};
pub use settings::{HostSettings, InputSettings};
pub use window::input::{
    ButtonMask, InputEvent, KeyEvent, KeyKind, Modifiers, MouseButton, NativeInput, PointerEvent,
    PointerKind, WheelAxis, WheelEvent, WheelGranularity,
};
pub use window::{
    CommitExecutor, CommitStats, HostApp, PopupController, PopupState, SignalHub,
    SurfaceController, SurfaceHost, SurfaceObserver, SurfaceRegistry, SurfaceSignal,
    SurfaceState, TaskQueue,
};
