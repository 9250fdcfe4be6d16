//! Surface lifecycle state.

use std::fmt;

/// Lifecycle of one surface. Only moves forward.
///
/// ```text
/// Uninitialized → Initialized → Destroying → Destroyed
/// ```
///
/// `Destroying → Destroyed` waits until no input dispatch for the surface
/// is on the call stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SurfaceState {
    #[default]
    Uninitialized,
    Initialized,
    Destroying,
    Destroyed,
}

impl SurfaceState {
    /// Whether input and scheduling operations do anything.
    pub fn is_live(self) -> bool {
        self == SurfaceState::Initialized
    }

    pub fn is_closing(self) -> bool {
        matches!(self, SurfaceState::Destroying | SurfaceState::Destroyed)
    }
}

impl fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceState::Uninitialized => "uninitialized",
            SurfaceState::Initialized => "initialized",
            SurfaceState::Destroying => "destroying",
            SurfaceState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}
