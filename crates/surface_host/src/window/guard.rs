//! Reentrancy guard
//!
//! Every entry point that reaches the engine holds an [`EnterGuard`] for its
//! duration. The engine may ask for the surface to close from inside such a
//! call; the close is then only recorded, and the last guard to drop runs
//! the deferred finalization.

use std::cell::Cell;

use super::state::SurfaceState;

/// A surface whose teardown can be deferred past active dispatches.
pub trait DeferredClose {
    fn enter_count(&self) -> &Cell<u32>;

    fn lifecycle(&self) -> SurfaceState;

    /// Must tolerate being called more than once.
    fn finalize_close(&self);
}

/// Scoped "inside a dispatch" marker. See [`try_enter`].
#[must_use]
pub struct EnterGuard<'a, T: DeferredClose + ?Sized> {
    owner: &'a T,
}

/// Enter the surface if it is live.
pub fn try_enter<T: DeferredClose + ?Sized>(owner: &T) -> Option<EnterGuard<'_, T>> {
    if !owner.lifecycle().is_live() {
        return None;
    }
    let count = owner.enter_count();
    count.set(count.get() + 1);
    Some(EnterGuard { owner })
}

impl<T: DeferredClose + ?Sized> Drop for EnterGuard<'_, T> {
    fn drop(&mut self) {
        let count = self.owner.enter_count();
        let remaining = count.get().saturating_sub(1);
        count.set(remaining);
        if remaining == 0 && self.owner.lifecycle() == SurfaceState::Destroying {
            tracing::debug!("Last dispatch unwound, running deferred close");
            self.owner.finalize_close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        count: Cell<u32>,
        state: Cell<SurfaceState>,
        finalized: Cell<u32>,
    }

    impl Fake {
        fn new(state: SurfaceState) -> Self {
            Self {
                count: Cell::new(0),
                state: Cell::new(state),
                finalized: Cell::new(0),
            }
        }
    }

    impl DeferredClose for Fake {
        fn enter_count(&self) -> &Cell<u32> {
            &self.count
        }

        fn lifecycle(&self) -> SurfaceState {
            self.state.get()
        }

        fn finalize_close(&self) {
            self.finalized.set(self.finalized.get() + 1);
            self.state.set(SurfaceState::Destroyed);
        }
    }

    #[test]
    fn test_only_live_surfaces_can_be_entered() {
        assert!(try_enter(&Fake::new(SurfaceState::Uninitialized)).is_none());
        assert!(try_enter(&Fake::new(SurfaceState::Destroying)).is_none());
        assert!(try_enter(&Fake::new(SurfaceState::Initialized)).is_some());
    }

    #[test]
    fn test_deferred_close_runs_once_after_outermost_guard() {
        let fake = Fake::new(SurfaceState::Initialized);
        {
            let _outer = try_enter(&fake).unwrap();
            {
                let _inner = try_enter(&fake).unwrap();
                fake.state.set(SurfaceState::Destroying);
            }
            assert_eq!(fake.finalized.get(), 0);
            assert_eq!(fake.count.get(), 1);
        }
        assert_eq!(fake.finalized.get(), 1);
        assert_eq!(fake.count.get(), 0);
    }
}
