//! Pointer capture ownership.
//!
//! The OS allows exactly one window to hold pointer capture. Platform
//! back-ends that have no native capture API record ownership here so a
//! surface losing capture can be told about it.

use parking_lot::Mutex;

use crate::context::SurfaceId;

#[derive(Default)]
pub struct CaptureSlot {
    owner: Mutex<Option<SurfaceId>>,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give capture to `surface`. Returns the previous owner if it was a
    /// different surface (that surface has now lost capture).
    pub fn acquire(&self, surface: SurfaceId) -> Option<SurfaceId> {
        let mut owner = self.owner.lock();
        let previous = owner.replace(surface);
        previous.filter(|prev| *prev != surface)
    }

    /// Release capture if `surface` holds it. Returns whether it did.
    pub fn release(&self, surface: SurfaceId) -> bool {
        let mut owner = self.owner.lock();
        if *owner == Some(surface) {
            *owner = None;
            true
        } else {
            false
        }
    }

    pub fn owner(&self) -> Option<SurfaceId> {
        *self.owner.lock()
    }

    pub fn is_held_by(&self, surface: SurfaceId) -> bool {
        self.owner() == Some(surface)
    }
}
