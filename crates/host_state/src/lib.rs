//! Host State Management
//!
//! Process-wide state shared by every embedded surface on the host.
//! - Surface registry and id allocation (`HostContext`)
//! - Pointer capture ownership (only one surface at a time)
//! - The "click outside" pointer hook slot (only one popup at a time)
//! - Init-once registration of the native popup window class
//!
//! Everything here is injected into the controllers that need it. The
//! `global()` accessor exists for the binary's convenience only.

pub mod capture;
pub mod context;
pub mod geometry;
pub mod hook;
pub mod registration;

pub use capture::CaptureSlot;
pub use context::{HostContext, SurfaceId, SurfaceInfo, SurfaceKind, WindowHandle};
pub use geometry::{Point, Rect, Size};
pub use hook::{HookInstallation, PointerHookSlot};
pub use registration::{ClassRegistration, HostStateError};
