//! Init-once registration of the native popup window class.

use parking_lot::Mutex;
use thiserror::Error;

/// Errors surfaced by process-wide host state.
#[derive(Debug, Error)]
pub enum HostStateError {
    #[error("Failed to register popup window class: {0}")]
    ClassRegistrationFailed(String),
}

/// Tracks whether the popup window class has been registered.
///
/// Registration happens at most once successfully per process. A failed
/// attempt leaves the class unregistered so the next popup can retry.
#[derive(Default)]
pub struct ClassRegistration {
    registered: Mutex<bool>,
}

impl ClassRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `register` unless a previous call already succeeded.
    pub fn ensure<E: std::fmt::Display>(
        &self,
        register: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), HostStateError> {
        // Held across the callback so two threads never register concurrently
        let mut registered = self.registered.lock();
        if *registered {
            return Ok(());
        }
        register().map_err(|e| HostStateError::ClassRegistrationFailed(e.to_string()))?;
        *registered = true;
        tracing::debug!("Registered native popup window class");
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        *self.registered.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_registers_once() {
        let registration = ClassRegistration::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            registration
                .ensure(|| {
                    calls.set(calls.get() + 1);
                    Ok::<(), String>(())
                })
                .unwrap();
        }

        assert_eq!(calls.get(), 1);
        assert!(registration.is_registered());
    }

    #[test]
    fn test_failure_allows_retry() {
        let registration = ClassRegistration::new();

        let failed = registration.ensure(|| Err("class atom exhausted"));
        assert!(matches!(failed, Err(HostStateError::ClassRegistrationFailed(_))));
        assert!(!registration.is_registered());

        registration.ensure(|| Ok::<(), String>(())).unwrap();
        assert!(registration.is_registered());
    }
}
